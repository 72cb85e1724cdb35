use crate::ids::BadgeId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "badge")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub tier: BadgeTier,
    /// Unique badges may be earned only once.
    pub unique: bool,
    /// Secret badges are not listed on the badge list.
    pub secret: bool,
    /// Total number of times awarded.
    pub count: i32,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum BadgeTier {
    #[sea_orm(num_value = 0)]
    Bronze,
    #[sea_orm(num_value = 1)]
    Silver,
    #[sea_orm(num_value = 2)]
    Gold,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
