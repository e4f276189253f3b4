//! Registered user storage
//!
//! Registration is an existence check followed by an insert. The store
//! performs both as one step so two concurrent sign-ups for the same email
//! produce exactly one account.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GateError;

/// Stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    /// Unique login identifier
    pub email: String,
    /// Argon2 PHC hash
    pub password_hash: String,
    /// Unset until the address is confirmed
    #[serde(default)]
    pub email_verified: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
}

impl UserRecord {
    pub fn new(user: NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            email_verified: None,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, GateError>;

    /// Insert unless the email is taken; `GateError::Conflict` if it is
    async fn insert(&self, user: NewUser) -> Result<UserRecord, GateError>;

    async fn count(&self) -> Result<usize, GateError>;
}

/// Process-local user store
#[derive(Default)]
pub struct MemoryUserStore {
    by_email: DashMap<String, UserRecord>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, GateError> {
        Ok(self.by_email.get(email).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, GateError> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(GateError::Conflict("User already exists".into())),
            Entry::Vacant(slot) => {
                let record = UserRecord::new(user);
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn count(&self) -> Result<usize, GateError> {
        Ok(self.by_email.len())
    }
}
