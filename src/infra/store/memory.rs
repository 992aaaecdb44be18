//! In-process store used for local development and tests.

use std::{cmp::Ordering, collections::BTreeMap};

use async_trait::async_trait;
use bytes::Bytes;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::{
    application::repos::{BlobStore, PostSlice, PostsRepo, RepoError},
    domain::{
        pagination::RowRange,
        posts::{PostId, PostPayload, PostRecord},
    },
};

/// Route prefix under which the HTTP layer serves stored blobs.
pub const MEDIA_ROUTE_PREFIX: &str = "/media/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
struct MemoryState {
    posts: Vec<PostRecord>,
    next_id: u64,
    blobs: BTreeMap<String, StoredBlob>,
}

pub struct MemoryStore {
    bucket: String,
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Insert fully-formed records, keeping their ids and timestamps.
    pub async fn seed(&self, records: impl IntoIterator<Item = PostRecord>) {
        let mut state = self.state.write().await;
        for record in records {
            if let Ok(numeric) = record.id.as_str().parse::<u64>() {
                state.next_id = state.next_id.max(numeric);
            }
            state.posts.push(record);
        }
    }

    pub async fn blob(&self, path: &str) -> Option<StoredBlob> {
        self.state.read().await.blobs.get(path).cloned()
    }

    /// Look up a blob by the part of its public URL after the media prefix.
    pub async fn media(&self, route_path: &str) -> Option<StoredBlob> {
        let path = route_path
            .strip_prefix(self.bucket.as_str())?
            .strip_prefix('/')?;
        self.blob(path).await
    }

    pub async fn blob_paths(&self) -> Vec<String> {
        self.state.read().await.blobs.keys().cloned().collect()
    }

    fn public_prefix(&self) -> String {
        format!("{MEDIA_ROUTE_PREFIX}{}/", self.bucket)
    }
}

/// Newest first; ties broken by the larger id.
fn listing_order(a: &PostRecord, b: &PostRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| id_key(&b.id).cmp(&id_key(&a.id)))
}

fn id_key(id: &PostId) -> (usize, &str) {
    (id.as_str().len(), id.as_str())
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(&self, range: RowRange) -> Result<PostSlice, RepoError> {
        let state = self.state.read().await;
        let mut ordered: Vec<&PostRecord> = state.posts.iter().collect();
        ordered.sort_by(|a, b| listing_order(a, b));

        let offset = usize::try_from(range.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(range.limit).unwrap_or(usize::MAX);
        let posts = ordered
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(PostSlice {
            posts,
            total_count: state.posts.len() as u64,
        })
    }

    async fn find_post(&self, id: &PostId) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|post| &post.id == id).cloned())
    }

    async fn insert_post(&self, payload: &PostPayload) -> Result<PostRecord, RepoError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let now = OffsetDateTime::now_utc();

        let record = PostRecord {
            id: PostId::new(state.next_id.to_string()),
            title: payload.title.clone(),
            author: payload.author.clone(),
            description: payload.description.clone(),
            content: payload.content.clone(),
            image_url: payload.image_url.clone(),
            created_at: now,
            updated_at: Some(now),
        };
        state.posts.push(record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        id: &PostId,
        payload: &PostPayload,
    ) -> Result<PostRecord, RepoError> {
        let mut state = self.state.write().await;
        let record = state
            .posts
            .iter_mut()
            .find(|post| &post.id == id)
            .ok_or(RepoError::NotFound)?;

        record.title.clone_from(&payload.title);
        record.author.clone_from(&payload.author);
        record.description.clone_from(&payload.description);
        record.content.clone_from(&payload.content);
        if let Some(image_url) = payload.image_url.as_ref() {
            record.image_url = Some(image_url.clone());
        }
        // Same-millisecond edits still count as edited.
        let floor = record.created_at + Duration::milliseconds(1);
        record.updated_at = Some(OffsetDateTime::now_utc().max(floor));

        Ok(record.clone())
    }

    async fn delete_post(&self, id: &PostId) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state.posts.retain(|post| &post.id != id);
        if state.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if state.blobs.contains_key(path) {
            return Err(RepoError::Status {
                status: 409,
                body: format!("object `{path}` already exists"),
            });
        }
        state.blobs.insert(
            path.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{path}", self.public_prefix())
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_prefix())
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        for path in paths {
            state.blobs.remove(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn payload(title: &str) -> PostPayload {
        PostPayload {
            title: title.into(),
            content: "<p>body</p>".into(),
            author: "Ada".into(),
            description: "desc".into(),
            image_url: None,
        }
    }

    fn record(id: &str, created_at: OffsetDateTime) -> PostRecord {
        PostRecord {
            id: PostId::new(id),
            title: format!("post {id}"),
            author: "Ada".into(),
            description: "desc".into(),
            content: "<p>body</p>".into(),
            image_url: None,
            created_at,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn lists_newest_first_with_exact_count() {
        let store = MemoryStore::new("bucket");
        let same = datetime!(2024-03-05 10:00 UTC);
        store
            .seed([
                record("1", datetime!(2024-01-01 0:00 UTC)),
                record("9", same),
                record("10", same),
            ])
            .await;

        let slice = store.list_posts(RowRange::for_page(1)).await.expect("list");
        let ids: Vec<_> = slice.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["10", "9", "1"]);
        assert_eq!(slice.total_count, 3);
    }

    #[tokio::test]
    async fn update_keeps_image_unless_replaced() {
        let store = MemoryStore::new("bucket");
        let mut first = payload("one");
        first.image_url = Some("/media/bucket/images/a.png".into());
        let created = store.insert_post(&first).await.expect("insert");

        let updated = store
            .update_post(&created.id, &payload("two"))
            .await
            .expect("update");

        assert_eq!(updated.title, "two");
        assert_eq!(updated.image_url, first.image_url);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.has_been_edited());
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        let store = MemoryStore::new("bucket");
        let id = PostId::new("404");
        assert!(matches!(
            store.update_post(&id, &payload("x")).await,
            Err(RepoError::NotFound)
        ));
        assert!(matches!(
            store.delete_post(&id).await,
            Err(RepoError::NotFound)
        ));
        assert_eq!(store.find_post(&id).await.expect("find"), None);
    }

    #[tokio::test]
    async fn blobs_map_to_public_urls() {
        let store = MemoryStore::new("bucket");
        store
            .upload("images/1-a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .expect("upload");

        let url = store.public_url("images/1-a.png");
        assert_eq!(url, "/media/bucket/images/1-a.png");
        assert_eq!(store.path_for_url(&url).as_deref(), Some("images/1-a.png"));
        assert_eq!(store.path_for_url("https://elsewhere/a.png"), None);

        let served = store.media("bucket/images/1-a.png").await.expect("served");
        assert_eq!(served.content_type, "image/png");
        assert_eq!(served.data, Bytes::from_static(b"png"));
        assert_eq!(store.media("other/images/1-a.png").await, None);
        assert_eq!(store.media("bucketimages/1-a.png").await, None);

        store.remove(&["images/1-a.png".to_string()]).await.expect("remove");
        assert!(store.blob_paths().await.is_empty());
    }
}
