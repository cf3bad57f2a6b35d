use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::models::{Principal, SESSION_COLLECTION, SessionRecord};
use crate::{
    auth::{AuthConfig, AuthError, generate_session_token},
    store::{DocumentStore, Filter, from_document, to_document},
};

/// Issues session tokens and resolves them back to an identity.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn DocumentStore>,
    config: AuthConfig,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("store", &self.store.backend())
            .field("config", &self.config)
            .finish()
    }
}

impl SessionService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Mint and persist a new session for `user_id`.
    ///
    /// Sessions are independent: a user may hold any number of them at once.
    ///
    /// # Errors
    /// Returns an error if the token cannot be generated or the record cannot be stored.
    #[instrument(skip(self))]
    pub async fn issue(&self, user_id: &str, now: DateTime<Utc>) -> Result<SessionRecord, AuthError> {
        let record = SessionRecord {
            user_id: user_id.to_string(),
            token: generate_session_token()?,
            expires_at: now + self.config.session_ttl(),
        };
        self.store
            .insert(SESSION_COLLECTION, to_document(&record)?)
            .await?;
        debug!(expires_at = %record.expires_at, "session issued");
        Ok(record)
    }

    /// Resolve a bearer token into the identity it was issued to.
    ///
    /// The token must match a stored one exactly; surrounding whitespace is
    /// not stripped. Expired sessions are rejected unless expiry enforcement
    /// is disabled, in which case a session authenticates for as long as its
    /// record exists.
    ///
    /// # Errors
    /// `MissingToken` when no token was supplied, `InvalidToken` when it is
    /// unknown, `SessionExpired` when it lapsed, or a store error.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = token.filter(|token| !token.is_empty());
        let Some(token) = token else {
            return Err(AuthError::MissingToken);
        };

        let filter = Filter::new().with("token", token);
        let Some(doc) = self
            .store
            .find(SESSION_COLLECTION, &filter, 1)
            .await?
            .into_iter()
            .next()
        else {
            return Err(AuthError::InvalidToken);
        };
        let record: SessionRecord = from_document(doc)?;

        if self.config.enforce_session_expiry() && record.is_expired(Utc::now()) {
            debug!(user_id = %record.user_id, "session expired");
            return Err(AuthError::SessionExpired);
        }

        Ok(Principal {
            user_id: record.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::Result;
    use chrono::Duration;

    fn service(config: AuthConfig) -> (Arc<MemoryStore>, SessionService) {
        let store = Arc::new(MemoryStore::new());
        let service = SessionService::new(store.clone(), config);
        (store, service)
    }

    #[tokio::test]
    async fn issue_persists_record_with_seven_day_expiry() -> Result<()> {
        let (store, sessions) = service(AuthConfig::new());
        let now = Utc::now();
        let record = sessions.issue("+15551234567", now).await?;

        assert_eq!(record.token.len(), 32);
        assert_eq!(record.expires_at, now + Duration::days(7));

        let stored = store
            .find(SESSION_COLLECTION, &Filter::new().with("token", record.token.as_str()), 1)
            .await?;
        assert_eq!(stored.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_resolves_phone() -> Result<()> {
        let (_store, sessions) = service(AuthConfig::new());
        let record = sessions.issue("+15551234567", Utc::now()).await?;
        let principal = sessions.authenticate(Some(&record.token)).await?;
        assert_eq!(principal.user_id, "+15551234567");
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_rejects_missing_and_unknown_tokens() {
        let (_store, sessions) = service(AuthConfig::new());
        assert!(matches!(
            sessions.authenticate(None).await,
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            sessions.authenticate(Some("")).await,
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            sessions.authenticate(Some("  ")).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            sessions.authenticate(Some("deadbeef")).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn padded_token_does_not_match() -> Result<()> {
        let (_store, sessions) = service(AuthConfig::new());
        let record = sessions.issue("+1", Utc::now()).await?;
        let padded = format!(" {}", record.token);
        assert!(matches!(
            sessions.authenticate(Some(&padded)).await,
            Err(AuthError::InvalidToken)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn expired_session_is_rejected_when_enforced() -> Result<()> {
        let (_store, sessions) = service(AuthConfig::new());
        let issued_at = Utc::now() - Duration::days(8);
        let record = sessions.issue("+15550000000", issued_at).await?;
        assert!(matches!(
            sessions.authenticate(Some(&record.token)).await,
            Err(AuthError::SessionExpired)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn expired_session_authenticates_when_not_enforced() -> Result<()> {
        let (_store, sessions) = service(AuthConfig::new().with_enforce_session_expiry(false));
        let issued_at = Utc::now() - Duration::days(30);
        let record = sessions.issue("+15550000000", issued_at).await?;
        let principal = sessions.authenticate(Some(&record.token)).await?;
        assert_eq!(principal.user_id, "+15550000000");
        Ok(())
    }

    #[tokio::test]
    async fn each_issue_yields_a_distinct_token() -> Result<()> {
        let (_store, sessions) = service(AuthConfig::new());
        let first = sessions.issue("+1", Utc::now()).await?;
        let second = sessions.issue("+1", Utc::now()).await?;
        assert_ne!(first.token, second.token);
        assert!(sessions.authenticate(Some(&first.token)).await.is_ok());
        assert!(sessions.authenticate(Some(&second.token)).await.is_ok());
        Ok(())
    }
}
