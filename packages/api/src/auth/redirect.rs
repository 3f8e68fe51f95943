//! Post-login redirect targets.

use url::form_urlencoded;

/// Where users land after login when no usable `next` was given.
pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

/// Return `next` when it is a same-origin relative path, `None` otherwise.
///
/// Accepted targets start with a single `/`. Protocol-relative (`//host`) and
/// backslash forms (`/\host`, which browsers normalise to `//host`) are rejected, as is
/// anything containing control characters.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?;
    if !next.starts_with('/') || next.starts_with("//") {
        return None;
    }
    if next.contains('\\') || next.chars().any(char::is_control) {
        return None;
    }
    Some(next)
}

/// Login page URL carrying `next` as an encoded query parameter.
pub fn login_url(next: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{LOGIN_PATH}?next={encoded}")
}
