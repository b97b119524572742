//! Commands exposed to the presentation layer
//!
//! Every command takes the application state and the caller's session
//! token, resolves the owner and delegates to a service:
//! - `goals`: goal tree, goal CRUD, star/pin, carry-over
//! - `migration`: max-week scan and period migration
//! - `status`: fire and pending flags
//! - `adhoc`: adhoc goal operations
//! - `logs`: goal log operations

pub mod adhoc;
pub mod goals;
pub mod logs;
pub mod migration;
pub mod status;

use crate::app::AppState;
use crate::error::Result;
use serde::Serialize;

pub use adhoc::*;
pub use goals::*;
pub use logs::*;
pub use migration::*;
pub use status::*;

/// Application information structure
#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub version: String,
    pub data_dir: String,
}

/// Get application information
pub async fn get_app_info(state: &AppState) -> Result<AppInfo> {
    Ok(AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_dir: state.data_dir.to_string_lossy().to_string(),
    })
}

/// Open a session for `user_id`, returning its token
pub async fn sign_in(state: &AppState, user_id: String) -> Result<String> {
    let session = state.session_service.create_session(&user_id).await?;
    Ok(session.id)
}

/// Close the session behind `session_token`
pub async fn sign_out(state: &AppState, session_token: String) -> Result<()> {
    state.session_service.end_session(&session_token).await
}
