use crate::ids::TagId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tag name plus its usage count. The count is derived from the number of
/// posts currently associated and is only ever touched by the tag index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: TagId,
    #[sea_orm(unique)]
    pub name: String,
    pub count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
