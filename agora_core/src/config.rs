use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

static DATA_DIR_NAME: &str = "agora";
static AGORA_DB_NAME: &str = "agora_db.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

// For now this directory structure should be like
// data_dir_path
// |- agora
//    |- agora_db.sqlite
//    |- config.json

fn default_hours_per_vote() -> u32 {
    1
}

fn default_content_indexing() -> bool {
    false
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgoraConfig {
    pub database_path: PathBuf,

    /// Rank hours gained per up-vote.
    ///
    /// `serde(default)` keeps backward compatibility with old config.json files.
    #[serde(default = "default_hours_per_vote")]
    pub hours_per_vote: u32,

    /// Whether finalized posts are pushed to the search indexer.
    #[serde(default = "default_content_indexing")]
    pub content_indexing: bool,
}

impl AgoraConfig {
    fn new(data_dir: PathBuf) -> Self {
        let database_path = data_dir.join(AGORA_DB_NAME);

        AgoraConfig {
            database_path,
            hours_per_vote: default_hours_per_vote(),
            content_indexing: default_content_indexing(),
        }
    }
}

/// Gets the existing config or initializes a new one if it doesn't exist
pub async fn get_or_init() -> Result<AgoraConfig, Box<dyn std::error::Error>> {
    let data_dir = dirs::data_dir().ok_or("failed to find a data directory on this platform")?;

    let agora_dir = data_dir.join(DATA_DIR_NAME);
    let config_path = agora_dir.join(CONFIG_FILE_NAME);

    // Create the agora directory if it doesn't exist
    fs::create_dir_all(&agora_dir).await?;

    // Check if config file exists
    if config_path.exists() {
        // Read and deserialize existing config
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: AgoraConfig = serde_json::from_str(&contents)?;
        Ok(config)
    } else {
        // Create new config
        let config = AgoraConfig::new(agora_dir.clone());

        // Serialize and write to file
        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        Ok(config)
    }
}
