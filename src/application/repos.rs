//! Store traits describing the hosted table and blob adapters.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::{
    pagination::RowRange,
    posts::{PostId, PostPayload, PostRecord},
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store request timed out")]
    Timeout,
    #[error("store responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("store response could not be decoded: {0}")]
    Decode(String),
    #[error("resource not found")]
    NotFound,
}

impl RepoError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Whether repeating the same idempotent request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Timeout | RepoError::Transport(_))
    }
}

/// One page of rows plus the exact total row count.
#[derive(Debug, Clone, Default)]
pub struct PostSlice {
    pub posts: Vec<PostRecord>,
    pub total_count: u64,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Range-select newest first with an exact total count.
    async fn list_posts(&self, range: RowRange) -> Result<PostSlice, RepoError>;

    async fn find_post(&self, id: &PostId) -> Result<Option<PostRecord>, RepoError>;

    async fn insert_post(&self, payload: &PostPayload) -> Result<PostRecord, RepoError>;

    /// Update in place; the store assigns `updated_at`.
    async fn update_post(&self, id: &PostId, payload: &PostPayload)
    -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: &PostId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), RepoError>;

    /// Publicly reachable URL for an uploaded path.
    fn public_url(&self, path: &str) -> String;

    /// Inverse of [`BlobStore::public_url`]; `None` for URLs outside this store.
    fn path_for_url(&self, url: &str) -> Option<String>;

    async fn remove(&self, paths: &[String]) -> Result<(), RepoError>;
}
