//! Settings service
//!
//! Manages application settings persistence using JSON file storage.

use crate::config::{
    DEFAULT_BUSY_TIMEOUT_SECS, DEFAULT_DATABASE_FILE, DEFAULT_MAX_CONNECTIONS, SETTINGS_FILE,
};
use crate::database::PoolOptions;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file, relative paths resolve against the data directory
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_FILE.to_string()
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_busy_timeout_secs() -> u64 {
    DEFAULT_BUSY_TIMEOUT_SECS
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl DatabaseSettings {
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_connections: self.max_connections.max(1),
            busy_timeout: Duration::from_secs(self.busy_timeout_secs),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    data_dir: PathBuf,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join(SETTINGS_FILE),
            data_dir,
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Absolute location of the database file
    pub fn database_path(&self, settings: &AppSettings) -> PathBuf {
        let path = Path::new(&settings.database.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Update database settings
    pub async fn update_database(&self, database: DatabaseSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.database = database;
        self.save(&settings).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.database.path, "goalflow.db");
        assert_eq!(settings.database.max_connections, 5);
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let (service, temp) = create_test_service();

        std::fs::write(
            temp.path().join("settings.json"),
            r#"{ "database": { "max_connections": 2 } }"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.database.max_connections, 2);
        assert_eq!(settings.database.busy_timeout_secs, 5);
        assert_eq!(settings.database.path, "goalflow.db");
    }

    #[tokio::test]
    async fn test_database_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            service
                .update_database(DatabaseSettings {
                    path: "data/goals.db".to_string(),
                    max_connections: 3,
                    busy_timeout_secs: 10,
                })
                .await
                .unwrap();
        }

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            let loaded = service.load().await.unwrap();
            assert_eq!(loaded.database.max_connections, 3);
            assert_eq!(
                service.database_path(&loaded),
                temp_dir.path().join("data/goals.db")
            );

            let options = loaded.database.pool_options();
            assert_eq!(options.busy_timeout, Duration::from_secs(10));
        }
    }

    #[tokio::test]
    async fn test_corrupt_settings_are_reported() {
        let (service, temp) = create_test_service();
        std::fs::write(temp.path().join("settings.json"), "{ not json").unwrap();

        let err = service.load().await.unwrap_err();
        assert_eq!(err.code(), "internal");
    }
}
