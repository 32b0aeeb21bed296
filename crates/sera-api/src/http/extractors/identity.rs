//! Cookie-based caller identity.
//!
//! Reads the identity cookie from the request. When it is absent (or blank)
//! a fresh UUID is minted and the handler must send it back via
//! [`CallerIdentity::attach`], which adds the `Set-Cookie` header.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use cookie::{Cookie, SameSite};

use sera_types::config::SessionCookieConfig;
use sera_types::conversation::UserId;

use crate::state::AppState;

/// Who is calling, and whether the identifier was minted for this request.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user: UserId,
    pub is_new: bool,
}

impl CallerIdentity {
    /// Resolve the caller from request headers.
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        match find_cookie(headers, cookie_name).and_then(|v| UserId::parse(&v)) {
            Some(user) => Self {
                user,
                is_new: false,
            },
            None => Self {
                user: UserId::generate(),
                is_new: true,
            },
        }
    }

    /// `Set-Cookie` value for a newly minted identifier.
    pub fn set_cookie(&self, config: &SessionCookieConfig) -> Option<HeaderValue> {
        if !self.is_new {
            return None;
        }
        let same_site = if config.cross_site {
            SameSite::None
        } else {
            SameSite::Lax
        };
        let cookie = Cookie::build((config.name.clone(), self.user.as_str().to_string()))
            .path(config.path.clone())
            .secure(config.secure)
            .http_only(config.http_only)
            .same_site(same_site)
            .max_age(cookie::time::Duration::seconds(config.max_age_secs))
            .build();

        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "identity cookie is not a valid header value");
                None
            }
        }
    }

    /// Turn `body` into a response, adding `Set-Cookie` when the id is new.
    pub fn attach(&self, config: &SessionCookieConfig, body: impl IntoResponse) -> Response {
        let mut response = body.into_response();
        if let Some(value) = self.set_cookie(config) {
            response.headers_mut().append(SET_COOKIE, value);
        }
        response
    }
}

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = Self::from_headers(&parts.headers, &state.session.name);
        if identity.is_new {
            tracing::debug!(user = %identity.user, "minted new user id");
        }
        Ok(identity)
    }
}

/// Value of the first cookie named `name` across all `Cookie` headers.
fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}
