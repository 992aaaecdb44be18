use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::Response,
};
use http_body_util::BodyExt;
use time::macros::datetime;
use tower::ServiceExt;

use folio::application::posts::PostService;
use folio::application::repos::PostsRepo;
use folio::application::session::{Credentials, SessionGate};
use folio::application::site::SiteProfile;
use folio::domain::pagination::RowRange;
use folio::domain::posts::{PostId, PostRecord};
use folio::infra::http::{HttpState, build_router};
use folio::infra::store::MemoryStore;

const SESSION_COOKIE: &str = "isAuthenticated=true";
const BOUNDARY: &str = "folio-test-boundary";

fn profile() -> SiteProfile {
    SiteProfile {
        owner_name: "Grace Hopper".to_string(),
        handle: "grace".to_string(),
        bio: "Compilers and nanoseconds.".to_string(),
        avatar_url: None,
        contact_email: Some("grace@example.com".to_string()),
        links: Vec::new(),
        projects: Vec::new(),
    }
}

fn record(id: &str, title: &str) -> PostRecord {
    PostRecord {
        id: PostId::new(id),
        title: title.to_string(),
        author: "Grace".to_string(),
        description: format!("About {title}"),
        content: format!("<p>{title} body</p>"),
        image_url: None,
        created_at: datetime!(2024-03-05 10:00 UTC),
        updated_at: None,
    }
}

fn app(store: Arc<MemoryStore>) -> Router {
    let posts = Arc::new(PostService::new(store.clone(), store.clone()));
    let session = Arc::new(SessionGate::new(Credentials::new("admin", "secret")));
    build_router(HttpState {
        posts,
        session,
        site: Arc::new(profile()),
        redirect_delay: Duration::from_secs(2),
        upload_limit_bytes: 1024 * 1024,
        media: Some(store),
    })
}

async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header(COOKIE, SESSION_COOKIE)
        .body(Body::empty())
        .expect("request")
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, file_name, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn admin_multipart(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::post(uri)
        .header(COOKIE, SESSION_COOKIE)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn admin_pages_redirect_without_session() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    for uri in ["/blog-home", "/blog-form", "/blog-home/1/delete"] {
        let response = app(store.clone()).oneshot(get(uri)).await.expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), Some("/admin-login"), "{uri}");
    }
}

#[tokio::test]
async fn login_sets_session_flag() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let request = Request::post("/admin-login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=secret"))
        .expect("request");
    let response = app(store).oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/blog-home"));
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    assert!(cookie.starts_with(SESSION_COOKIE), "{cookie}");
}

#[tokio::test]
async fn wrong_password_shows_error_and_sets_nothing() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let request = Request::post("/admin-login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=nope"))
        .expect("request");
    let response = app(store).oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = body_text(response).await;
    assert!(body.contains("Invalid username or password"));
    assert!(body.contains("value=\"admin\""));
}

#[tokio::test]
async fn login_page_skips_ahead_when_signed_in() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let response = app(store)
        .oneshot(admin_get("/admin-login"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/blog-home"));
}

#[tokio::test]
async fn logout_clears_session_flag() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let request = Request::post("/logout")
        .header(COOKIE, SESSION_COOKIE)
        .body(Body::empty())
        .expect("request");
    let response = app(store).oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin-login"));
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("removal cookie");
    assert!(cookie.starts_with("isAuthenticated="), "{cookie}");
    assert!(!cookie.starts_with(SESSION_COOKIE), "{cookie}");
}

#[tokio::test]
async fn home_shows_profile_and_posts() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    store.seed([record("1", "Bugs and moths")]).await;

    let response = app(store).oneshot(get("/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Grace Hopper"));
    assert!(body.contains("Bugs and moths"));
    assert!(body.contains("mailto:grace@example.com"));
    assert!(body.contains("5 March 2024"));
}

#[tokio::test]
async fn home_tolerates_garbage_page_numbers() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    store.seed([record("1", "Only post")]).await;

    let response = app(store)
        .oneshot(get("/?page=banana"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Only post"));
}

#[tokio::test]
async fn detail_marks_edited_posts() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    let mut edited = record("2", "Edited one");
    edited.updated_at = Some(datetime!(2024-04-01 09:00 UTC));
    store.seed([record("1", "Fresh one"), edited]).await;

    let fresh = app(store.clone())
        .oneshot(get("/blog-post/1"))
        .await
        .expect("response");
    assert_eq!(fresh.status(), StatusCode::OK);
    assert!(!body_text(fresh).await.contains("Last edited on"));

    let edited = app(store)
        .oneshot(get("/blog-post/2"))
        .await
        .expect("response");
    let body = body_text(edited).await;
    assert!(body.contains("Last edited on 1 April 2024"));
    assert!(body.contains("<p>Edited one body</p>"));
}

#[tokio::test]
async fn detail_of_missing_post_is_not_found() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let response = app(store)
        .oneshot(get("/blog-post/999"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detail_strips_scripts_from_content() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    let mut hostile = record("1", "Hostile");
    hostile.content = "<p>ok</p><script>alert(1)</script>".to_string();
    store.seed([hostile]).await;

    let response = app(store)
        .oneshot(get("/blog-post/1"))
        .await
        .expect("response");
    let body = body_text(response).await;
    assert!(body.contains("<p>ok</p>"));
    assert!(!body.contains("alert(1)"));
}

#[tokio::test]
async fn unknown_routes_render_not_found_page() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let response = app(store)
        .oneshot(get("/nowhere"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page Not Found"));
}

#[tokio::test]
async fn admin_listing_renders_with_session() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    store.seed([record("1", "Admin visible")]).await;

    let response = app(store)
        .oneshot(admin_get("/blog-home"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Admin visible"));
    assert!(body.contains("/blog-form?id=1"));
    assert!(body.contains("Log out"));
}

#[tokio::test]
async fn edit_form_is_prefilled() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    store.seed([record("1", "Prefilled")]).await;

    let response = app(store)
        .oneshot(admin_get("/blog-form?id=1"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("value=\"Prefilled\""));
    assert!(body.contains("name=\"id\" value=\"1\""));
    assert!(body.contains("<p>Prefilled body</p>"));
}

#[tokio::test]
async fn submitting_the_form_creates_a_post() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let body = multipart(
        &[
            ("token", "2f1c7e64-6a1b-4bb2-9f5e-3c1d2a9b8e70"),
            ("title", "From the form"),
            ("author", "Grace"),
            ("description", "Created over HTTP"),
            ("content", "<p>Hello <em>world</em></p>"),
        ],
        Some(("image", "Cover.png", "image/png", b"\x89PNG\r\n\x1a\n")),
    );
    let response = app(store.clone())
        .oneshot(admin_multipart("/blog-form", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Post saved successfully!"));
    assert!(page.contains("/blog-home"));

    let slice = store.list_posts(RowRange::for_page(1)).await.expect("list");
    assert_eq!(slice.total_count, 1);
    let saved = &slice.posts[0];
    assert_eq!(saved.title, "From the form");
    assert!(
        saved
            .image_url
            .as_deref()
            .is_some_and(|url| url.ends_with("-cover.png"))
    );
}

#[tokio::test]
async fn uploaded_cover_is_served_from_its_public_url() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    let png: &[u8] = b"\x89PNG\r\n\x1a\ncat";

    let body = multipart(
        &[
            ("token", "7d0e5b1a-3c44-4f0e-8a51-0b6f2c9e1d23"),
            ("title", "Cat pictures"),
            ("author", "Grace"),
            ("description", "A cat"),
            ("content", "<p>Meow</p>"),
        ],
        Some(("image", "cat.png", "image/png", png)),
    );
    let response = app(store.clone())
        .oneshot(admin_multipart("/blog-form", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let slice = store.list_posts(RowRange::for_page(1)).await.expect("list");
    let url = slice.posts[0].image_url.clone().expect("cover url");
    assert!(url.starts_with("/media/blog_posts/images/"), "{url}");

    let image = app(store.clone())
        .oneshot(get(&url))
        .await
        .expect("response");
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()[CONTENT_TYPE], "image/png");
    let bytes = image.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(bytes.as_ref(), png);

    let missing = app(store)
        .oneshot(get("/media/blog_posts/images/0-missing.png"))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_views_neutralize_hostile_descriptions() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    let mut hostile = record("1", "Hostile");
    hostile.description =
        r#"Field notes<script>alert(1)</script><img src=x onerror="steal()">"#.to_string();
    store.seed([hostile]).await;

    let public = app(store.clone())
        .oneshot(get("/"))
        .await
        .expect("response");
    let admin = app(store)
        .oneshot(admin_get("/blog-home"))
        .await
        .expect("response");

    for response in [public, admin] {
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Field notes"), "{body}");
        assert!(!body.contains("<script"), "{body}");
        assert!(!body.contains("onerror"), "{body}");
        assert!(!body.contains("<img src=x"), "{body}");
    }
}

#[tokio::test]
async fn invalid_submission_keeps_the_input() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let body = multipart(
        &[
            ("title", "Half done"),
            ("author", ""),
            ("description", "No author yet"),
            ("content", "<p>text</p>"),
        ],
        Some(("image", "", "application/octet-stream", b"")),
    );
    let response = app(store.clone())
        .oneshot(admin_multipart("/blog-form", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = body_text(response).await;
    assert!(page.contains("value=\"Half done\""));
    assert!(page.contains("No author yet"));

    let slice = store.list_posts(RowRange::for_page(1)).await.expect("list");
    assert_eq!(slice.total_count, 0);
}

#[tokio::test]
async fn confirmed_delete_removes_post_and_rerenders_listing() {
    let store = Arc::new(MemoryStore::new("blog_posts"));
    store
        .seed([record("1", "Keep me"), record("2", "Remove me")])
        .await;

    let confirm = app(store.clone())
        .oneshot(admin_get("/blog-home/2/delete?page=1"))
        .await
        .expect("response");
    assert_eq!(confirm.status(), StatusCode::OK);
    assert!(body_text(confirm).await.contains("Remove me"));

    let request = Request::post("/blog-home/2/delete")
        .header(COOKIE, SESSION_COOKIE)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("page=1"))
        .expect("request");
    let response = app(store.clone()).oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Keep me"));
    assert!(body.contains("(1)"));

    assert!(
        store
            .find_post(&PostId::new("2"))
            .await
            .expect("find")
            .is_none()
    );
}

#[tokio::test]
async fn editor_image_returns_data_url() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let body = multipart(&[], Some(("file", "dot.png", "image/png", b"\x89PNG")));
    let response = app(store)
        .oneshot(admin_multipart("/blog-form/image", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json body");
    assert_eq!(json["data_url"], "data:image/png;base64,iVBORw==");
    assert!(json.get("content").is_none());
}

#[tokio::test]
async fn editor_image_splices_into_content() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let body = multipart(
        &[("content", "<p>ab</p>"), ("selection", "4")],
        Some(("file", "dot.png", "image/png", b"\x89PNG")),
    );
    let response = app(store)
        .oneshot(admin_multipart("/blog-form/image", body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json body");
    assert_eq!(
        json["content"],
        "<p>a<img src=\"data:image/png;base64,iVBORw==\">b</p>"
    );
}

#[tokio::test]
async fn editor_image_rejects_non_images() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let body = multipart(&[], Some(("file", "notes.txt", "text/plain", b"hi")));
    let response = app(store)
        .oneshot(admin_multipart("/blog-form/image", body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn theme_toggle_flips_cookie_and_returns() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let request = Request::post("/theme")
        .header("referer", "http://localhost:3000/blog-post/1")
        .body(Body::empty())
        .expect("request");
    let response = app(store).oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/blog-post/1"));
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("theme cookie");
    assert!(cookie.starts_with("theme=dark"), "{cookie}");
}

#[tokio::test]
async fn static_assets_are_served() {
    let store = Arc::new(MemoryStore::new("blog_posts"));

    let response = app(store)
        .oneshot(get("/static/editor.js"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let health = app(Arc::new(MemoryStore::new("blog_posts")))
        .oneshot(get("/_health"))
        .await
        .expect("response");
    assert_eq!(health.status(), StatusCode::NO_CONTENT);
}
