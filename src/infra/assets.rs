//! Embedded static asset and in-process media serving.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use mime_guess::Mime;

use crate::{application::error::ErrorReport, infra::store::StoredBlob};

const SOURCE: &str = "infra::assets::serve_static";
const MEDIA_SOURCE: &str = "infra::assets::media_response";

static STATIC_ASSETS: &[(&str, &str)] = &[
    ("editor.js", include_str!("../../static/editor.js")),
    ("site.css", include_str!("../../static/site.css")),
];

/// Serve an embedded asset from `/static/{file}`.
pub async fn serve_static(Path(file): Path<String>) -> Response {
    match resolve_asset(&file) {
        Some(asset) => asset.into_response(),
        None => {
            let mut response = StatusCode::NOT_FOUND.into_response();
            ErrorReport::from_message(SOURCE, StatusCode::NOT_FOUND, "Static asset not found")
                .attach(&mut response);
            response
        }
    }
}

/// Response for a blob held by the in-memory store; `None` becomes a 404.
pub fn media_response(blob: Option<StoredBlob>) -> Response {
    match blob {
        Some(blob) => bytes_response(blob.data, &blob.content_type, "public, max-age=31536000"),
        None => {
            let mut response = StatusCode::NOT_FOUND.into_response();
            ErrorReport::from_message(MEDIA_SOURCE, StatusCode::NOT_FOUND, "Media not found")
                .attach(&mut response);
            response
        }
    }
}

struct Asset {
    contents: &'static str,
    mime: Mime,
}

fn resolve_asset(name: &str) -> Option<Asset> {
    let candidate = name.trim_start_matches('/');
    if candidate.is_empty() || candidate.contains('/') || candidate.contains("..") {
        return None;
    }

    STATIC_ASSETS
        .iter()
        .find(|(asset, _)| *asset == candidate)
        .map(|(asset, contents)| Asset {
            contents,
            mime: mime_guess::from_path(asset).first_or_octet_stream(),
        })
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        bytes_response(
            Bytes::from_static(self.contents.as_bytes()),
            self.mime.as_ref(),
            "public, max-age=3600",
        )
    }
}

fn bytes_response(bytes: Bytes, content_type: &str, cache_control: &'static str) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    response
}
