//! User records written to a document store on sign-in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use huecraft_contracts::documents::DocumentFile;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::{AppConfig, FirestoreConfig};
use crate::error::IdentityError;
use crate::http::truncate_text;

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl UserRecord {
    pub fn new(id: &str, email: &str) -> Result<Self, IdentityError> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(IdentityError::InvalidUserId(id.to_string()));
        }
        Ok(Self {
            id: id.to_string(),
            email: email.trim().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

pub trait UserDirectory: Send + Sync {
    /// Creates or replaces the record stored under `record.id`.
    fn upsert(&self, record: &UserRecord) -> Result<(), IdentityError>;
}

/// Firestore REST documents API.
pub struct FirestoreDirectory {
    http: HttpClient,
    config: FirestoreConfig,
    timeout: Duration,
}

impl FirestoreDirectory {
    pub fn new(config: FirestoreConfig, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(),
            config,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Option<Self> {
        config
            .firestore
            .clone()
            .map(|firestore| Self::new(firestore, config.request_timeout))
    }

    fn document_url(&self, id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{USERS_COLLECTION}/{id}",
            self.config.api_base, self.config.project
        )
    }
}

impl UserDirectory for FirestoreDirectory {
    fn upsert(&self, record: &UserRecord) -> Result<(), IdentityError> {
        let url = self.document_url(&record.id);
        let body = json!({
            "fields": {
                "email": {"stringValue": record.email},
                "createdAt": {"timestampValue": record.created_at},
            }
        });
        let mut request = self.http.patch(&url).timeout(self.timeout).json(&body);
        if let Some(token) = self.config.bearer_token.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.query(&[("key", key)]);
        }
        let response = request.send().map_err(IdentityError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(IdentityError::Http {
                status: status.as_u16(),
                message: truncate_text(&text, 512),
            });
        }
        tracing::debug!(user = %record.id, "user record stored in Firestore");
        Ok(())
    }
}

/// Local stand-in for the document store: `{"users": {id: {...}}}` in one
/// JSON file.
pub struct JsonFileDirectory {
    file: DocumentFile,
}

impl JsonFileDirectory {
    pub fn new(file: DocumentFile) -> Self {
        Self { file }
    }

    pub fn get(&self, id: &str) -> Option<Map<String, Value>> {
        self.file.get(USERS_COLLECTION, id)
    }
}

impl UserDirectory for JsonFileDirectory {
    fn upsert(&self, record: &UserRecord) -> Result<(), IdentityError> {
        let mut fields = Map::new();
        fields.insert("email".to_string(), Value::String(record.email.clone()));
        fields.insert(
            "createdAt".to_string(),
            Value::String(record.created_at.clone()),
        );
        self.file.set(USERS_COLLECTION, &record.id, fields)?;
        tracing::debug!(user = %record.id, path = %self.file.path().display(), "user record stored");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Stored(UserRecord),
    AlreadySynced,
}

#[derive(Debug, Default)]
struct Session {
    user_id: Option<String>,
    synced: bool,
}

/// Writes the user record once per sign-in. Signing in again as the same user
/// is a no-op after a successful write; a failed write is retried on the next
/// sign-in call.
pub struct IdentitySync {
    directory: Arc<dyn UserDirectory>,
    session: Mutex<Session>,
}

impl IdentitySync {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            session: Mutex::new(Session::default()),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn signed_in_user(&self) -> Option<String> {
        self.session().user_id.clone()
    }

    pub fn sign_in(&self, id: &str, email: &str) -> Result<SyncOutcome, IdentityError> {
        let record = UserRecord::new(id, email)?;
        let mut session = self.session();
        if session.user_id.as_deref() == Some(record.id.as_str()) && session.synced {
            return Ok(SyncOutcome::AlreadySynced);
        }
        session.user_id = Some(record.id.clone());
        session.synced = false;

        match self.directory.upsert(&record) {
            Ok(()) => {
                session.synced = true;
                tracing::info!(user = %record.id, "user record synced");
                Ok(SyncOutcome::Stored(record))
            }
            Err(err) => {
                tracing::warn!(user = %record.id, error = %err, "storing user record failed");
                Err(err)
            }
        }
    }

    pub fn sign_out(&self) {
        let mut session = self.session();
        if let Some(user) = session.user_id.take() {
            tracing::debug!(%user, "signed out");
        }
        session.synced = false;
    }
}
