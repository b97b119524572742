//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::database::{create_pool_with, Repository};
use crate::error::Result;
use crate::services::{
    AdhocService, GoalLogsService, GoalsService, MigrationService, SessionService,
    SettingsService, StatusService,
};
use sqlx::SqlitePool;
use std::path::PathBuf;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub goals_service: GoalsService,
    pub migration_service: MigrationService,
    pub status_service: StatusService,
    pub adhoc_service: AdhocService,
    pub logs_service: GoalLogsService,
    pub session_service: SessionService,
    pub settings_service: SettingsService,
}

impl AppState {
    /// Wire every service onto an already migrated pool
    pub fn from_pool(data_dir: PathBuf, pool: SqlitePool) -> Self {
        let repo = Repository::new(pool);

        Self {
            goals_service: GoalsService::new(repo.clone()),
            migration_service: MigrationService::new(repo.clone()),
            status_service: StatusService::new(repo.clone()),
            adhoc_service: AdhocService::new(repo.clone()),
            logs_service: GoalLogsService::new(repo.clone()),
            session_service: SessionService::new(repo),
            settings_service: SettingsService::new(data_dir.clone()),
            data_dir,
        }
    }

    /// Application setup: load settings, open and migrate the database
    pub async fn initialize(data_dir: PathBuf) -> Result<Self> {
        tracing::info!("Initializing goalflow in {:?}", data_dir);

        std::fs::create_dir_all(&data_dir)?;

        let settings_service = SettingsService::new(data_dir.clone());
        let settings = settings_service.load().await?;
        let db_path = settings_service.database_path(&settings);

        let pool = create_pool_with(&db_path, settings.database.pool_options()).await?;
        let state = Self::from_pool(data_dir, pool);

        tracing::info!("Application initialized successfully");

        Ok(state)
    }

    /// Resolve the owner behind a session token
    pub async fn authenticate(&self, session_token: &str) -> Result<String> {
        self.session_service.resolve_owner(session_token).await
    }
}
