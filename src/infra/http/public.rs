use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::REFERER},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::{
    application::{
        posts::{PostError, PostListing},
        preferences::ThemePreference,
        render::PUBLIC_EXCERPT_CHARS,
    },
    domain::{pagination::PageCursor, posts::PostId},
    infra::assets::media_response,
    presentation::views::{
        HomeContext, HomeTemplate, LayoutContext, PaginationView, PostCard, PostDetailContext,
        PostDetailTemplate, ProfileView, render_not_found_response, render_template_response,
    },
};

use super::{HttpState, cookies::CookieStorage};

#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Requested page number; anything unparseable means the first page.
    pub(super) fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }
}

pub(super) async fn home(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let storage = CookieStorage::new(jar);
    let chrome = state.chrome(&storage);

    let content = match PostListing::open(state.posts.clone(), query.page()).await {
        Ok(listing) => HomeContext {
            profile: ProfileView::from(state.site.as_ref()),
            posts: listing
                .posts()
                .iter()
                .map(|post| PostCard::from_record(post, PUBLIC_EXCERPT_CHARS))
                .collect(),
            pagination: PaginationView::new(listing.cursor(), "/", "#blog"),
            notice: None,
        },
        Err(err) => {
            warn!(
                target = "folio::http::public",
                error = %err,
                "blog section could not load posts"
            );
            HomeContext {
                profile: ProfileView::from(state.site.as_ref()),
                posts: Vec::new(),
                pagination: PaginationView::new(PageCursor::new(0), "/", "#blog"),
                notice: Some(err.user_message()),
            }
        }
    };

    let view = LayoutContext::new(chrome, content);
    render_template_response(HomeTemplate { view }, StatusCode::OK)
}

pub(super) async fn media(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    let blob = match &state.media {
        Some(store) => store.media(&path).await,
        None => None,
    };
    media_response(blob)
}

pub(super) async fn post_detail(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let storage = CookieStorage::new(jar);
    let chrome = state.chrome(&storage);

    let Some(id) = PostId::parse(&id) else {
        return render_not_found_response(chrome);
    };

    match state.posts.load_one(&id).await {
        Ok(post) => {
            let chrome = chrome.with_title(&post.title);
            let view = LayoutContext::new(chrome, PostDetailContext::from(&post));
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Err(PostError::NotFound) => render_not_found_response(chrome),
        Err(err) => {
            warn!(
                target = "folio::http::public",
                post_id = %id.as_str(),
                error = %err,
                "post detail could not be loaded"
            );
            render_not_found_response(chrome)
        }
    }
}

pub(super) async fn toggle_theme(jar: CookieJar, headers: HeaderMap) -> Response {
    let mut storage = CookieStorage::new(jar);
    ThemePreference::toggle(&mut storage);

    let target = headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(return_path)
        .unwrap_or_else(|| "/".to_string());

    (storage.into_jar(), Redirect::to(&target)).into_response()
}

/// Reduce a referer to a same-site path so the redirect never leaves the site.
fn return_path(referer: &str) -> Option<String> {
    let url = Url::parse(referer).ok()?;
    let path = url.path();
    if !path.starts_with('/') || path.starts_with("//") {
        return None;
    }
    Some(match url.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    })
}

pub(super) async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub(super) async fn not_found(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let storage = CookieStorage::new(jar);
    render_not_found_response(state.chrome(&storage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_falls_back_to_first_page() {
        let parse = |raw: Option<&str>| {
            PageQuery {
                page: raw.map(str::to_string),
            }
            .page()
        };
        assert_eq!(parse(None), 1);
        assert_eq!(parse(Some("3")), 3);
        assert_eq!(parse(Some("0")), 1);
        assert_eq!(parse(Some("abc")), 1);
    }

    #[test]
    fn return_path_keeps_only_path_and_query() {
        assert_eq!(
            return_path("http://localhost:3000/blog-post/7?x=1").as_deref(),
            Some("/blog-post/7?x=1")
        );
        assert_eq!(
            return_path("https://evil.example/").as_deref(),
            Some("/")
        );
        assert_eq!(return_path("not a url"), None);
    }
}
