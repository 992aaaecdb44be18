use std::sync::Arc;

use crate::domain::{
    pagination::PageCursor,
    posts::{PostId, PostRecord},
};

use super::{service::PostService, types::PostError};

/// Paginated listing as currently shown to one viewer.
pub struct PostListing {
    service: Arc<PostService>,
    posts: Vec<PostRecord>,
    cursor: PageCursor,
    total_count: u64,
}

impl PostListing {
    /// Load `requested`, falling back to the last page when it lies beyond the end.
    pub async fn open(service: Arc<PostService>, requested: u32) -> Result<Self, PostError> {
        let requested = requested.max(1);
        let mut page = service.load_page(requested).await?;
        let mut cursor = PageCursor::new(page.total_count);

        let last = cursor.total_pages();
        let current = if last > 0 && requested > last {
            page = service.load_page(last).await?;
            cursor.set_total(page.total_count);
            cursor.total_pages().max(1)
        } else {
            requested
        };
        cursor.request(current);

        Ok(Self {
            service,
            total_count: page.total_count,
            posts: page.posts,
            cursor,
        })
    }

    /// Fetch page `page`. Returns `false` without fetching when it is out of range.
    pub async fn change_page(&mut self, page: u32) -> Result<bool, PostError> {
        if !self.cursor.contains(page) {
            return Ok(false);
        }

        let fetched = self.service.load_page(page).await?;
        self.total_count = fetched.total_count;
        self.posts = fetched.posts;
        self.cursor.request(page);
        self.cursor.set_total(self.total_count);
        Ok(true)
    }

    /// Delete a post shown on this page and drop it from the list without re-fetching.
    pub async fn delete(&mut self, id: &PostId) -> Result<PostRecord, PostError> {
        let index = self
            .posts
            .iter()
            .position(|post| &post.id == id)
            .ok_or(PostError::NotFound)?;

        self.service.delete(&self.posts[index]).await?;

        let removed = self.posts.remove(index);
        self.total_count = self.total_count.saturating_sub(1);
        self.cursor.set_total(self.total_count);
        Ok(removed)
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
