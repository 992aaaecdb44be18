mod auth;
mod cookies;
mod middleware;
mod multipart;
mod posts;
mod public;

pub use cookies::CookieStorage;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::{
    application::{
        posts::PostService,
        preferences::ThemePreference,
        session::{ClientStorage, SessionGate},
        site::SiteProfile,
    },
    infra::{assets::serve_static, store::MemoryStore},
    presentation::views::LayoutChrome,
};

use self::middleware::{log_responses, require_session, set_request_context};

pub const LOGIN_PATH: &str = "/admin-login";
pub const ADMIN_HOME_PATH: &str = "/blog-home";

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub session: Arc<SessionGate>,
    pub site: Arc<SiteProfile>,
    pub redirect_delay: Duration,
    pub upload_limit_bytes: usize,
    /// In-process blob store whose uploads are served under `/media/`.
    pub media: Option<Arc<MemoryStore>>,
}

impl HttpState {
    fn chrome(&self, storage: &impl ClientStorage) -> LayoutChrome {
        LayoutChrome::new(
            &self.site,
            ThemePreference::read(storage),
            self.session.is_authenticated(storage),
        )
    }
}

pub fn build_router(state: HttpState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.upload_limit_bytes);

    let admin_routes = Router::new()
        .route(ADMIN_HOME_PATH, get(posts::blog_home))
        .route(
            "/blog-home/{id}/delete",
            get(posts::delete_confirm).post(posts::delete_post),
        )
        .route(
            "/blog-form",
            get(posts::post_form)
                .post(posts::submit_post)
                .layer(upload_limit.clone()),
        )
        .route(
            "/blog-form/image",
            post(posts::editor_image).layer(upload_limit),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(public::home))
        .route("/blog-post/{id}", get(public::post_detail))
        .route(LOGIN_PATH, get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/theme", post(public::toggle_theme))
        .route("/static/{*file}", get(serve_static))
        .route("/media/{*path}", get(public::media))
        .route("/_health", get(public::health))
        .merge(admin_routes)
        .fallback(public::not_found)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .with_state(state)
}
