use axum::http::{HeaderMap, header};

pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const OAUTH_STATE: &str = "oauth_state";

pub const STATE_TTL_SECS: u64 = 3600;
pub const REFRESH_TTL_SECS: u64 = 90 * 24 * 60 * 60;

/// HTTP-only session cookie string, path `/`, SameSite=Lax.
pub fn set(name: &str, value: &str, max_age_secs: u64) -> String {
    format!("{name}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Removal cookie for `name`.
pub fn clear(name: &str) -> String {
    format!("{name}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

/// Reads a cookie value from the request's Cookie header.
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let cookie = cookie.trim();
                cookie
                    .strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix('='))
                    .map(|s| s.to_string())
            })
        })
}
