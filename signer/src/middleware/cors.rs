use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
        },
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};

use crate::{state::AppState, types::ConfigError};

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";
const ALLOW_HEADERS_WITH_AUTH: &str = "Content-Type, Authorization";

/// Cross-origin headers stamped on every signer response
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origin: Option<HeaderValue>,
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    /// Builds the policy from the configured origin override
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the origin is not a valid header value
    pub fn new(allowed_origin: Option<&str>, with_auth: bool) -> Result<Self, ConfigError> {
        let allowed_origin = allowed_origin
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidValue {
                    name: "ALLOWED_ORIGIN",
                    value: origin.to_string(),
                })
            })
            .transpose()?;

        let allow_headers = HeaderValue::from_static(if with_auth {
            ALLOW_HEADERS_WITH_AUTH
        } else {
            ALLOW_HEADERS
        });

        Ok(Self {
            allowed_origin,
            allow_headers,
        })
    }

    /// Origin to allow for a request that sent `request_origin`
    fn allow_origin(&self, request_origin: Option<HeaderValue>) -> HeaderValue {
        self.allowed_origin
            .clone()
            .or(request_origin)
            .unwrap_or_else(|| HeaderValue::from_static(""))
    }
}

/// Adds the CORS headers to every response, including rejections
pub async fn cors_headers(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let request_origin = request.headers().get(ORIGIN).cloned();
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        state.cors.allow_origin(request_origin),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, state.cors.allow_headers.clone());
    if state.cors.allowed_origin.is_none() {
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }

    response
}
