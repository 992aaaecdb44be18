use bytes::Bytes;
use thiserror::Error;

use crate::{
    application::repos::RepoError,
    domain::{
        error::DomainError,
        posts::{PostForm, PostId, PostRecord},
    },
};

use super::guard::FormToken;

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("post not found")]
    NotFound,
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error("cover image upload failed: {0}")]
    Upload(#[source] RepoError),
    #[error("cover image rejected: {0}")]
    UnsupportedImage(String),
    #[error("post could not be saved: {0}")]
    Save(#[source] RepoError),
    #[error("posts could not be loaded: {0}")]
    Load(#[source] RepoError),
    #[error("post image could not be removed: {0}")]
    BlobCleanup(#[source] RepoError),
    #[error("post could not be deleted: {0}")]
    Delete(#[source] RepoError),
}

impl PostError {
    /// Message shown to the user in place of the failing screen.
    pub fn user_message(&self) -> String {
        match self {
            PostError::Invalid(err) => err.to_string(),
            PostError::NotFound => "Post not found".to_string(),
            PostError::SubmissionInFlight => "A submission is already in progress".to_string(),
            PostError::Upload(_) => "Error uploading image. Please try again.".to_string(),
            PostError::UnsupportedImage(_) => "Cover image must be an image file.".to_string(),
            PostError::Save(_) => "Error saving post. Please try again.".to_string(),
            PostError::Load(_) => "Posts could not be loaded".to_string(),
            PostError::BlobCleanup(_) => {
                "Error deleting the post image. The post was kept.".to_string()
            }
            PostError::Delete(_) => "Error deleting post. Please try again.".to_string(),
        }
    }
}

/// Cover image attached to a form submission.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct SubmitPostCommand {
    pub form: PostForm,
    pub image: Option<ImageUpload>,
    pub existing_id: Option<PostId>,
    pub token: FormToken,
}

/// One fetched listing page.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub posts: Vec<PostRecord>,
    pub total_count: u64,
}

