//! Session service
//!
//! Resolves an opaque session token to the owner every other service is
//! scoped by.

use crate::config::DEFAULT_SESSION_TTL_DAYS;
use crate::database::{Repository, Session};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};

/// Service resolving authenticated owners
#[derive(Clone)]
pub struct SessionService {
    repo: Repository,
}

impl SessionService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open a session for `user_id` with the default lifetime
    pub async fn create_session(&self, user_id: &str) -> Result<Session> {
        if user_id.trim().is_empty() {
            return Err(AppError::InvalidArgument("user id cannot be empty".to_string()));
        }

        let expires_at = Utc::now() + Duration::days(DEFAULT_SESSION_TTL_DAYS);
        let session = self.repo.create_session(user_id, Some(expires_at)).await?;

        tracing::info!("Session opened for user {}", user_id);
        Ok(session)
    }

    /// Owner behind `token`, or access denied
    pub async fn resolve_owner(&self, token: &str) -> Result<String> {
        let session = self
            .repo
            .find_session(token)
            .await?
            .ok_or_else(|| AppError::AccessDenied("unknown session".to_string()))?;

        if session.expires_at.is_some_and(|expires| expires <= Utc::now()) {
            tracing::warn!("Rejected expired session for user {}", session.user_id);
            return Err(AppError::AccessDenied("session expired".to_string()));
        }

        Ok(session.user_id)
    }

    pub async fn end_session(&self, token: &str) -> Result<()> {
        self.repo.delete_session(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;

    #[tokio::test]
    async fn test_resolve_owner() {
        let service = SessionService::new(create_test_repo().await);

        let session = service.create_session("u1").await.unwrap();
        assert_eq!(service.resolve_owner(&session.id).await.unwrap(), "u1");

        service.end_session(&session.id).await.unwrap();
        let err = service.resolve_owner(&session.id).await.unwrap_err();
        assert_eq!(err.code(), "access_denied");
    }

    #[tokio::test]
    async fn test_expired_session_is_denied() {
        let repo = create_test_repo().await;
        let service = SessionService::new(repo.clone());

        let session = repo
            .create_session("u1", Some(Utc::now() - Duration::minutes(1)))
            .await
            .unwrap();

        let err = service.resolve_owner(&session.id).await.unwrap_err();
        assert_eq!(err.code(), "access_denied");
    }
}
