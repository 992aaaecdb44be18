//! Client-local storage carried in browser cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::application::session::ClientStorage;

/// Cookie jar adapter; changes are sent back by returning [`CookieStorage::into_jar`].
#[derive(Debug, Default)]
pub struct CookieStorage {
    jar: CookieJar,
}

impl CookieStorage {
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl ClientStorage for CookieStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|cookie| cookie.value().to_string())
    }

    fn set(&mut self, key: &str, value: &str) {
        let cookie = Cookie::build((key.to_string(), value.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .permanent();
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    fn remove(&mut self, key: &str) {
        let cookie = Cookie::build((key.to_string(), String::new())).path("/");
        self.jar = std::mem::take(&mut self.jar).remove(cookie);
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::header::SET_COOKIE, response::IntoResponse};

    use super::*;

    #[test]
    fn set_and_remove_emit_cookie_headers() {
        let mut storage = CookieStorage::default();
        storage.set("theme", "dark");
        assert_eq!(storage.get("theme").as_deref(), Some("dark"));

        let response = storage.into_jar().into_response();
        let header = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("set-cookie");
        assert!(header.starts_with("theme=dark"));
        assert!(header.contains("Path=/"));

        let mut storage = CookieStorage::new(CookieJar::new().add(Cookie::new("theme", "dark")));
        storage.remove("theme");
        assert_eq!(storage.get("theme"), None);
    }
}
