//!  Remote persistence of study records is abstracted through [RemoteStore].
//!  The basic idea is:
//!   - There is a single remote table holding every record.
//!   - Records are read in bulk, inserted one at a time and deleted by their (title, time) pair.
//!   - Nothing is cached here, all local state lives in [crate::app].

pub mod entities;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use entities::StudyRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store responded with {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("malformed store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

/// Capabilities the application needs from the remote table. Implementations decide what
/// happens when zero or several rows match a deletion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns every stored record. Order is unspecified.
    async fn list_all(&self) -> Result<Vec<StudyRecord>, StoreError>;

    /// Appends a single record. Duplicates are allowed.
    async fn insert(&self, record: StudyRecord) -> Result<(), StoreError>;

    /// Deletes all records whose title and time are equal to the ones of `target`.
    async fn delete_matching(&self, target: StudyRecord) -> Result<(), StoreError>;
}
