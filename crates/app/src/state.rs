//! Application state management

use std::path::Path;

use lobby_core::config::data_dir;
use lobby_core::{Database, LobbyConfig, Result, Username};
use tracing::info;

const CLIENT_DB: &str = "lobby.db";
const STORE_DB: &str = "store.db";

/// Client-side state: configuration and the local session database
pub struct AppState {
    pub config: LobbyConfig,
    db: Database,
}

impl AppState {
    pub fn new(config: LobbyConfig) -> Result<Self> {
        let path = data_dir()?.join(CLIENT_DB);
        Self::open_at(config, path)
    }

    pub fn open_at<P: AsRef<Path>>(config: LobbyConfig, path: P) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self { config, db })
    }

    /// Name persisted from an earlier run
    pub fn saved_name(&self) -> Result<Option<Username>> {
        self.db.session().load()
    }

    /// Validate and persist a name typed by the user
    pub fn choose_name(&self, raw: &str) -> Result<Username> {
        let name = Username::parse(raw, self.config.chat.max_sender_name_length)?;
        self.db.session().save(&name)?;
        info!(name = %name, "Display name saved");
        Ok(name)
    }

    pub fn clear_name(&self) -> Result<()> {
        self.db.session().clear()
    }
}

/// Default location of the store's log
pub fn default_store_path() -> Result<std::path::PathBuf> {
    Ok(data_dir()?.join(STORE_DB))
}
