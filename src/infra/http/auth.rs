use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::presentation::views::{
    LayoutContext, LoginContext, LoginTemplate, render_template_response,
};

use super::{ADMIN_HOME_PATH, HttpState, LOGIN_PATH, cookies::CookieStorage};

#[derive(Debug, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub(super) async fn login_page(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let storage = CookieStorage::new(jar);
    if state.session.is_authenticated(&storage) {
        return Redirect::to(ADMIN_HOME_PATH).into_response();
    }

    render_login(&state, &storage, String::new(), None, StatusCode::OK)
}

pub(super) async fn login(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut storage = CookieStorage::new(jar);
    match state
        .session
        .login(&mut storage, &form.username, &form.password)
    {
        Ok(()) => (storage.into_jar(), Redirect::to(ADMIN_HOME_PATH)).into_response(),
        Err(err) => render_login(
            &state,
            &storage,
            form.username,
            Some(err.to_string()),
            StatusCode::UNAUTHORIZED,
        ),
    }
}

pub(super) async fn logout(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let mut storage = CookieStorage::new(jar);
    state.session.logout(&mut storage);
    (storage.into_jar(), Redirect::to(LOGIN_PATH)).into_response()
}

fn render_login(
    state: &HttpState,
    storage: &CookieStorage,
    username: String,
    error: Option<String>,
    status: StatusCode,
) -> Response {
    let chrome = state.chrome(storage).with_title("Admin login");
    let view = LayoutContext::new(chrome, LoginContext { username, error });
    render_template_response(LoginTemplate { view }, status)
}
