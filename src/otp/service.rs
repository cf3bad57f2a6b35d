use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::models::{OTP_COLLECTION, OtpRecord, OtpStatus};
use crate::{
    auth::{AuthConfig, AuthError, generate_code},
    session::{SessionRecord, SessionService},
    store::{Document, DocumentStore, Filter, from_document, to_document},
};

/// Result of a code request.
///
/// The code is handed back to the caller instead of being sent by SMS; this
/// service is a demo backend with no SMS gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpIssued {
    pub code: String,
    pub expires_in: i64,
}

/// Issues one-time codes and redeems them for sessions.
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn DocumentStore>,
    config: AuthConfig,
    sessions: SessionService,
}

impl std::fmt::Debug for OtpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpService")
            .field("store", &self.store.backend())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OtpService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: AuthConfig, sessions: SessionService) -> Self {
        Self {
            store,
            config,
            sessions,
        }
    }

    /// Create a pending code for `phone`.
    ///
    /// Earlier pending codes for the same phone are left untouched.
    ///
    /// # Errors
    /// `Validation` when the phone is blank, or a store error.
    #[instrument(skip(self))]
    pub async fn request(&self, phone: &str) -> Result<OtpIssued, AuthError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(AuthError::Validation("Phone"));
        }

        let code = generate_code();
        let expires_at = Utc::now() + self.config.otp_ttl();
        let record = OtpRecord::pending(phone, code, expires_at);

        self.store
            .insert(OTP_COLLECTION, to_document(&record)?)
            .await?;
        debug!(%expires_at, "otp issued");

        Ok(OtpIssued {
            code: record.code,
            expires_in: self.config.otp_ttl_seconds(),
        })
    }

    /// Redeem a code and mint a session for the phone it was issued to.
    ///
    /// Redemption is not single-use: while a code is within its deadline,
    /// every successful call issues a new session.
    ///
    /// # Errors
    /// `InvalidCode` when no record matches, `CodeExpired` when the matched
    /// record lapsed, or a store/token generation error.
    #[instrument(skip(self, code))]
    pub async fn verify(&self, phone: &str, code: &str) -> Result<SessionRecord, AuthError> {
        let phone = phone.trim();
        let code = code.trim();
        let now = Utc::now();

        let filter = Self::pair_filter(phone, code);
        let Some(doc) = self
            .store
            .find(OTP_COLLECTION, &filter, 1)
            .await?
            .into_iter()
            .next()
        else {
            return Err(AuthError::InvalidCode);
        };
        let record: OtpRecord = from_document(doc)?;

        if !record.is_redeemable(now) {
            return Err(AuthError::CodeExpired);
        }

        let session = self.sessions.issue(phone, now).await?;

        self.mark_verified_best_effort(phone, code, now).await;

        Ok(session)
    }

    /// Flip every record for the pair to `verified`.
    ///
    /// Fire-and-forget bookkeeping: the session is already issued when this
    /// runs, and a failure here only leaves the records `pending`.
    async fn mark_verified_best_effort(&self, phone: &str, code: &str, now: DateTime<Utc>) {
        let mut patch = Document::new();
        patch.insert(
            "status".to_string(),
            Value::String(OtpStatus::Verified.as_str().to_string()),
        );
        patch.insert(
            "updated_at".to_string(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let filter = Self::pair_filter(phone, code);
        match self.store.update_many(OTP_COLLECTION, &filter, patch).await {
            Ok(updated) => debug!(updated, "otp marked verified"),
            Err(err) => warn!("Failed to mark otp verified: {err}"),
        }
    }

    fn pair_filter(phone: &str, code: &str) -> Filter {
        Filter::new().with("phone", phone).with("code", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::Duration;

    fn service_with(store: Arc<dyn DocumentStore>, config: AuthConfig) -> OtpService {
        let sessions = SessionService::new(store.clone(), config.clone());
        OtpService::new(store, config, sessions)
    }

    fn service() -> (Arc<MemoryStore>, OtpService) {
        let store = Arc::new(MemoryStore::new());
        let otp = service_with(store.clone(), AuthConfig::new());
        (store, otp)
    }

    async fn stored_records(store: &MemoryStore, phone: &str) -> Result<Vec<OtpRecord>> {
        store
            .find(OTP_COLLECTION, &Filter::new().with("phone", phone), 100)
            .await?
            .into_iter()
            .map(|doc| from_document(doc).map_err(anyhow::Error::from))
            .collect()
    }

    #[tokio::test]
    async fn request_persists_pending_record() -> Result<()> {
        let (store, otp) = service();
        let before = Utc::now();
        let issued = otp.request("  +15551234567 ").await?;
        let after = Utc::now();

        assert_eq!(issued.code.len(), 6);
        assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(issued.expires_in, 300);

        let records = stored_records(&store, "+15551234567").await?;
        let record = records.first().ok_or_else(|| anyhow!("no record stored"))?;
        assert_eq!(record.code, issued.code);
        assert_eq!(record.status, OtpStatus::Pending);
        assert_eq!(record.attempts, 0);
        assert!(record.expires_at >= before + Duration::minutes(5));
        assert!(record.expires_at <= after + Duration::minutes(5));
        Ok(())
    }

    #[tokio::test]
    async fn request_rejects_blank_phone() {
        let (_store, otp) = service();
        assert!(matches!(
            otp.request("   ").await,
            Err(AuthError::Validation("Phone"))
        ));
    }

    #[tokio::test]
    async fn repeated_requests_accumulate_records() -> Result<()> {
        let (store, otp) = service();
        otp.request("+1").await?;
        otp.request("+1").await?;
        assert_eq!(stored_records(&store, "+1").await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn verify_issues_session_and_marks_verified() -> Result<()> {
        let (store, otp) = service();
        let issued = otp.request("+15551234567").await?;
        let session = otp.verify(" +15551234567", &format!(" {} ", issued.code)).await?;

        assert_eq!(session.user_id, "+15551234567");
        assert_eq!(session.token.len(), 32);

        let records = stored_records(&store, "+15551234567").await?;
        assert!(records.iter().all(|r| r.status == OtpStatus::Verified));
        Ok(())
    }

    #[tokio::test]
    async fn verified_records_keep_store_timestamp_format() -> Result<()> {
        let (store, otp) = service();
        let issued = otp.request("+1").await?;
        otp.verify("+1", &issued.code).await?;

        let docs = store
            .find(OTP_COLLECTION, &Filter::new().with("phone", "+1"), 10)
            .await?;
        let doc = docs.first().ok_or_else(|| anyhow!("no record stored"))?;
        let created_at = doc.get("created_at").and_then(Value::as_str).unwrap_or_default();
        let updated_at = doc.get("updated_at").and_then(Value::as_str).unwrap_or_default();

        // 2024-01-01T00:00:00.000000Z
        assert_eq!(updated_at.len(), 27);
        assert!(updated_at.ends_with('Z'));
        assert_eq!(updated_at.len(), created_at.len());
        assert!(DateTime::parse_from_rfc3339(updated_at).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn verify_unknown_code_is_invalid() -> Result<()> {
        let (_store, otp) = service();
        let issued = otp.request("+1").await?;
        let wrong = if issued.code == "000000" { "000001" } else { "000000" };
        assert!(matches!(
            otp.verify("+1", wrong).await,
            Err(AuthError::InvalidCode)
        ));
        assert!(matches!(
            otp.verify("+2", &issued.code).await,
            Err(AuthError::InvalidCode)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn verify_lapsed_code_is_expired() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let record = OtpRecord::pending("+1", "123456".to_string(), Utc::now() - Duration::seconds(1));
        store.insert(OTP_COLLECTION, to_document(&record)?).await?;

        let otp = service_with(store, AuthConfig::new());
        assert!(matches!(
            otp.verify("+1", "123456").await,
            Err(AuthError::CodeExpired)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn verify_expired_status_is_rejected() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let mut record =
            OtpRecord::pending("+1", "123456".to_string(), Utc::now() + Duration::minutes(5));
        record.status = OtpStatus::Expired;
        store.insert(OTP_COLLECTION, to_document(&record)?).await?;

        let otp = service_with(store, AuthConfig::new());
        assert!(matches!(
            otp.verify("+1", "123456").await,
            Err(AuthError::CodeExpired)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn verify_is_not_single_use() -> Result<()> {
        let (_store, otp) = service();
        let issued = otp.request("+1").await?;
        let first = otp.verify("+1", &issued.code).await?;
        let second = otp.verify("+1", &issued.code).await?;
        assert_ne!(first.token, second.token);
        Ok(())
    }

    /// Memory store whose bulk updates always fail.
    struct FailingUpdates(MemoryStore);

    #[async_trait]
    impl DocumentStore for FailingUpdates {
        async fn insert(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
            self.0.insert(collection, doc).await
        }

        async fn find(
            &self,
            collection: &str,
            filter: &Filter,
            limit: usize,
        ) -> Result<Vec<Document>, StoreError> {
            self.0.find(collection, filter, limit).await
        }

        async fn update_many(
            &self,
            _collection: &str,
            _filter: &Filter,
            _patch: Document,
        ) -> Result<u64, StoreError> {
            Err(StoreError::InvalidDocument("update refused".to_string()))
        }

        async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
            self.0.list_collections().await
        }

        fn backend(&self) -> &'static str {
            "failing"
        }

        fn is_persistent(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn bookkeeping_failure_does_not_fail_verification() -> Result<()> {
        let store = Arc::new(FailingUpdates(MemoryStore::new()));
        let otp = service_with(store.clone(), AuthConfig::new());
        let issued = otp.request("+1").await?;

        let session = otp.verify("+1", &issued.code).await?;
        assert_eq!(session.user_id, "+1");

        let records = store
            .find(OTP_COLLECTION, &Filter::new().with("phone", "+1"), 10)
            .await?;
        assert_eq!(
            records.first().and_then(|doc| doc.get("status")),
            Some(&Value::String("pending".to_string()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn expires_in_follows_configured_ttl() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let otp = service_with(store, AuthConfig::new().with_otp_ttl_seconds(60));
        assert_eq!(otp.request("+1").await?.expires_in, 60);
        Ok(())
    }
}
