//! Fixed cross-origin response for the ingress resource.
//!
//! The same header set is returned to every preflight, whatever the request's origin.

use axum::http::HeaderName;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};

pub const ALLOW_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token,X-Amz-User-Agent";
pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_CREDENTIALS: &str = "false";
pub const ALLOW_METHODS: &str = "OPTIONS,GET,PUT,POST,DELETE";

pub fn preflight_headers() -> [(HeaderName, &'static str); 4] {
    [
        (ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
        (ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
        (ACCESS_CONTROL_ALLOW_CREDENTIALS, ALLOW_CREDENTIALS),
        (ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
    ]
}
