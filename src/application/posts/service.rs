use std::{path::Path, sync::Arc};

use slug::slugify;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    application::repos::{BlobStore, PostsRepo, RepoError},
    domain::{
        pagination::RowRange,
        posts::{PostId, PostRecord},
    },
};

use super::{
    guard::SubmissionGuard,
    types::{ImageUpload, PostError, PostPage, SubmitPostCommand},
};

const UPLOAD_DIRECTORY: &str = "images";

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    blobs: Arc<dyn BlobStore>,
    guard: SubmissionGuard,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostsRepo>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            posts,
            blobs,
            guard: SubmissionGuard::new(),
        }
    }

    pub fn guard(&self) -> &SubmissionGuard {
        &self.guard
    }

    pub async fn load_page(&self, page: u32) -> Result<PostPage, PostError> {
        let slice = self
            .posts
            .list_posts(RowRange::for_page(page))
            .await
            .map_err(|err| {
                warn!(
                    target = "application::posts::load_page",
                    page,
                    error = %err,
                    "failed to load posts"
                );
                PostError::Load(err)
            })?;

        Ok(PostPage {
            posts: slice.posts,
            total_count: slice.total_count,
        })
    }

    pub async fn load_one(&self, id: &PostId) -> Result<PostRecord, PostError> {
        match self.posts.find_post(id).await {
            Ok(Some(post)) => Ok(post),
            Ok(None) | Err(RepoError::NotFound) => Err(PostError::NotFound),
            Err(err) => {
                warn!(
                    target = "application::posts::load_one",
                    post_id = %id,
                    error = %err,
                    "failed to load post"
                );
                Err(PostError::Load(err))
            }
        }
    }

    /// Validate, upload the optional cover image, then insert or update.
    pub async fn submit(&self, command: SubmitPostCommand) -> Result<PostRecord, PostError> {
        let SubmitPostCommand {
            form,
            image,
            existing_id,
            token,
        } = command;

        let _permit = self
            .guard
            .acquire(token)
            .ok_or(PostError::SubmissionInFlight)?;

        let mut payload = form.into_payload(None)?;

        if let Some(image) = image {
            payload.image_url = Some(self.store_cover_image(image).await?);
        }

        let (operation, result) = match &existing_id {
            Some(id) => ("update", self.posts.update_post(id, &payload).await),
            None => ("insert", self.posts.insert_post(&payload).await),
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(RepoError::NotFound) => return Err(PostError::NotFound),
            Err(err) => {
                warn!(
                    target = "application::posts::submit",
                    operation,
                    error = %err,
                    "failed to save post"
                );
                return Err(PostError::Save(err));
            }
        };

        metrics::counter!("folio_post_saved_total", "operation" => operation).increment(1);
        info!(
            target = "application::posts::submit",
            operation,
            post_id = %saved.id,
            "post saved"
        );

        Ok(saved)
    }

    async fn store_cover_image(&self, image: ImageUpload) -> Result<String, PostError> {
        if !image.content_type.starts_with("image/") {
            return Err(PostError::UnsupportedImage(image.content_type));
        }

        let path = upload_path(&image.file_name, OffsetDateTime::now_utc());
        self.blobs
            .upload(&path, image.data, &image.content_type)
            .await
            .map_err(|err| {
                warn!(
                    target = "application::posts::store_cover_image",
                    path = %path,
                    error = %err,
                    "failed to upload cover image"
                );
                PostError::Upload(err)
            })?;

        Ok(self.blobs.public_url(&path))
    }

    /// Remove the post's stored cover image, then the record itself.
    ///
    /// A failed image removal leaves the record in place.
    pub async fn delete(&self, post: &PostRecord) -> Result<(), PostError> {
        let blob_path = post
            .image_url
            .as_deref()
            .and_then(|url| self.blobs.path_for_url(url));

        if let Some(path) = blob_path {
            self.blobs
                .remove(std::slice::from_ref(&path))
                .await
                .map_err(|err| {
                    warn!(
                        target = "application::posts::delete",
                        post_id = %post.id,
                        path = %path,
                        error = %err,
                        "failed to remove post image"
                    );
                    PostError::BlobCleanup(err)
                })?;
        }

        match self.posts.delete_post(&post.id).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(PostError::NotFound),
            Err(err) => {
                warn!(
                    target = "application::posts::delete",
                    post_id = %post.id,
                    error = %err,
                    "failed to delete post"
                );
                return Err(PostError::Delete(err));
            }
        }

        metrics::counter!("folio_post_deleted_total").increment(1);
        info!(
            target = "application::posts::delete",
            post_id = %post.id,
            "post deleted"
        );
        Ok(())
    }
}

/// Storage path for an uploaded cover image: `images/<unix-millis>-<name>`.
pub fn upload_path(file_name: &str, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    format!("{UPLOAD_DIRECTORY}/{millis}-{}", sanitize_file_name(file_name))
}

fn sanitize_file_name(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("image");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "image".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn upload_path_prefixes_millis_and_slugs_name() {
        let now = datetime!(2024-03-05 10:00:00.123 UTC);
        assert_eq!(
            upload_path("My Holiday Photo.JPG", now),
            "images/1709632800123-my-holiday-photo.jpg"
        );
    }

    #[test]
    fn unusable_names_fall_back() {
        let now = datetime!(2024-03-05 10:00:00 UTC);
        assert_eq!(upload_path("???", now), "images/1709632800000-image");
        assert_eq!(upload_path("../../etc/passwd", now), "images/1709632800000-passwd");
    }
}
