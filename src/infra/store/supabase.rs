//! Supabase (PostgREST + Storage) adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE, RANGE},
};
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

use crate::{
    application::repos::{BlobStore, PostSlice, PostsRepo, RepoError},
    config::SupabaseSettings,
    domain::{
        pagination::RowRange,
        posts::{PostId, PostPayload, PostRecord},
    },
    infra::error::InfraError,
};

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const RANGE_UNIT_HEADER: &str = "Range-Unit";
const LISTING_ORDER: &str = "created_at.desc,id.desc";

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    rest_endpoint: Url,
    object_endpoint: String,
    api_key: String,
    bucket: String,
    read_retries: u32,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    #[serde(flatten)]
    payload: &'a PostPayload,
    #[serde(serialize_with = "crate::util::timestamps::serialize")]
    updated_at: OffsetDateTime,
}

impl SupabaseStore {
    pub fn new(
        settings: &SupabaseSettings,
        table: &str,
        bucket: &str,
        timeout: Duration,
        read_retries: u32,
    ) -> Result<Self, InfraError> {
        let mut base = settings.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let rest_endpoint = base
            .join(&format!("rest/v1/{table}"))
            .map_err(|err| InfraError::configuration(format!("invalid store url: {err}")))?;
        let object_endpoint = base
            .join("storage/v1/object/")
            .map_err(|err| InfraError::configuration(format!("invalid store url: {err}")))?
            .to_string();

        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::store(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            rest_endpoint,
            object_endpoint,
            api_key: settings.api_key.clone(),
            bucket: bucket.to_string(),
            read_retries,
        })
    }

    fn table_url(&self, query: &[(&str, &str)]) -> Url {
        let mut url = self.rest_endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    fn public_prefix(&self) -> String {
        format!("{}public/{}/", self.object_endpoint, self.bucket)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    /// Send an idempotent read, retrying on timeouts and connection failures.
    async fn send_read(
        &self,
        operation: &'static str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, RepoError> {
        let mut attempt = 0;
        loop {
            match self.send(operation, build()).await {
                Err(err) if err.is_transient() && attempt < self.read_retries => {
                    attempt += 1;
                    debug!(
                        target = "infra::store::supabase",
                        operation,
                        attempt,
                        error = %err,
                        "retrying store read"
                    );
                }
                result => return result,
            }
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, RepoError> {
        let started = Instant::now();
        let result = self.authorize(request).send().await.map_err(|err| {
            if err.is_timeout() {
                RepoError::Timeout
            } else {
                RepoError::transport(err)
            }
        });

        let outcome = match &result {
            Ok(response) if response.status().is_success() => "ok",
            Ok(_) => "status",
            Err(RepoError::Timeout) => "timeout",
            Err(_) => "transport",
        };
        metrics::counter!(
            "folio_store_request_total",
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("folio_store_request_ms", "operation" => operation)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        result
    }
}

async fn ensure_success(response: Response) -> Result<Response, RepoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RepoError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_rows(response: Response) -> Result<Vec<PostRecord>, RepoError> {
    let bytes = ensure_success(response)
        .await?
        .bytes()
        .await
        .map_err(RepoError::transport)?;
    serde_json::from_slice(&bytes).map_err(RepoError::decode)
}

/// Total row count from a PostgREST `Content-Range` value such as `0-5/13` or `*/0`.
pub(crate) fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl PostsRepo for SupabaseStore {
    async fn list_posts(&self, range: RowRange) -> Result<PostSlice, RepoError> {
        let url = self.table_url(&[("select", "*"), ("order", LISTING_ORDER)]);
        let range_header = format!("{}-{}", range.offset, range.last());

        let response = self
            .send_read("list_posts", || {
                self.client
                    .get(url.clone())
                    .header(RANGE_UNIT_HEADER, "items")
                    .header(RANGE, &range_header)
                    .header(PREFER_HEADER, "count=exact")
            })
            .await?;

        let total_header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range);

        // Requesting past the last row.
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(PostSlice {
                posts: Vec::new(),
                total_count: total_header.unwrap_or(0),
            });
        }

        let posts = decode_rows(response).await?;
        let total_count = total_header.unwrap_or(range.offset + posts.len() as u64);
        Ok(PostSlice { posts, total_count })
    }

    async fn find_post(&self, id: &PostId) -> Result<Option<PostRecord>, RepoError> {
        let filter = format!("eq.{id}");
        let url = self.table_url(&[("select", "*"), ("id", &filter)]);

        let response = self
            .send_read("find_post", || self.client.get(url.clone()))
            .await?;
        Ok(decode_rows(response).await?.into_iter().next())
    }

    async fn insert_post(&self, payload: &PostPayload) -> Result<PostRecord, RepoError> {
        let request = self
            .client
            .post(self.rest_endpoint.clone())
            .header(PREFER_HEADER, "return=representation")
            .json(&[payload]);

        let response = self.send("insert_post", request).await?;
        decode_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::decode("insert returned no rows"))
    }

    async fn update_post(
        &self,
        id: &PostId,
        payload: &PostPayload,
    ) -> Result<PostRecord, RepoError> {
        let filter = format!("eq.{id}");
        let body = UpdateBody {
            payload,
            updated_at: OffsetDateTime::now_utc(),
        };
        let request = self
            .client
            .patch(self.table_url(&[("id", &filter)]))
            .header(PREFER_HEADER, "return=representation")
            .json(&body);

        let response = self.send("update_post", request).await?;
        decode_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: &PostId) -> Result<(), RepoError> {
        let filter = format!("eq.{id}");
        let request = self
            .client
            .delete(self.table_url(&[("id", &filter)]))
            .header(PREFER_HEADER, "return=minimal");

        let response = self.send("delete_post", request).await?;
        ensure_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl BlobStore for SupabaseStore {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), RepoError> {
        let url = format!("{}{}/{}", self.object_endpoint, self.bucket, path);
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(data);

        let response = self.send("upload_blob", request).await?;
        ensure_success(response).await.map(|_| ())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}", self.public_prefix(), path)
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.public_prefix())?;
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        (!path.is_empty()).then(|| path.to_string())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), RepoError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}{}", self.object_endpoint, self.bucket);
        let request = self
            .client
            .delete(url)
            .json(&json!({ "prefixes": paths }));

        let response = self.send("remove_blobs", request).await?;
        ensure_success(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> SupabaseStore {
        let settings = SupabaseSettings {
            url: Url::parse(base).expect("url"),
            api_key: "anon".into(),
        };
        SupabaseStore::new(&settings, "blog_posts", "blog_posts", Duration::from_secs(5), 0)
            .expect("store")
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range("0-5/13"), Some(13));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-5/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn public_urls_round_trip_to_paths() {
        let store = store("https://project.supabase.co");
        let url = store.public_url("images/1-cat.png");
        assert_eq!(
            url,
            "https://project.supabase.co/storage/v1/object/public/blog_posts/images/1-cat.png"
        );
        assert_eq!(store.path_for_url(&url).as_deref(), Some("images/1-cat.png"));
    }

    #[test]
    fn foreign_urls_have_no_path() {
        let store = store("https://project.supabase.co/");
        assert_eq!(store.path_for_url("https://cdn.example.com/cat.png"), None);
        assert_eq!(
            store.path_for_url(
                "https://project.supabase.co/storage/v1/object/public/other/images/cat.png"
            ),
            None
        );
    }

    #[test]
    fn table_urls_carry_filters() {
        let store = store("https://project.supabase.co");
        let url = store.table_url(&[("id", "eq.7")]);
        assert_eq!(url.path(), "/rest/v1/blog_posts");
        assert_eq!(url.query(), Some("id=eq.7"));
    }

    #[test]
    fn update_body_keeps_image_url_out_unless_replaced() {
        let payload = PostPayload {
            title: "t".into(),
            content: "<p>c</p>".into(),
            author: "a".into(),
            description: "d".into(),
            image_url: None,
        };
        let body = serde_json::to_value(UpdateBody {
            payload: &payload,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        })
        .expect("json");

        assert!(body.get("image_url").is_none());
        assert_eq!(body["updated_at"], "1970-01-01T00:00:00Z");
        assert_eq!(body["title"], "t");
    }
}
