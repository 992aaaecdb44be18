//! Post listing, detail, edit and delete operations.

mod guard;
mod listing;
mod service;
mod types;

pub use guard::{FormToken, SubmissionGuard, SubmissionPermit};
pub use listing::PostListing;
pub use service::{PostService, upload_path};
pub use types::{ImageUpload, PostError, PostPage, SubmitPostCommand};
