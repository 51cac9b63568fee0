use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use driveview_config::Settings;
use driveview_services::{OAuthFlow, RetryOutcome, RetryPolicy, UserProfile};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    cookies,
    error::ApiError,
    extractors::session::Session,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /api/auth/login` — sets the anti-CSRF state cookie and redirects
/// the user agent to the identity provider.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap), ApiError> {
    if state.settings.oauth.client_id.is_empty() {
        return Err(ApiError::Internal(
            "OAuth configuration is missing: no client id".to_string(),
        ));
    }

    let state_token = OAuthFlow::generate_state();
    let redirect_uri = callback_url(&state.settings, &headers);
    let auth_url = state.oauth.authorize_url(&redirect_uri, &state_token);

    info!(%redirect_uri, "redirecting to identity provider");

    let mut out = HeaderMap::new();
    out.insert(
        header::SET_COOKIE,
        cookies::set(cookies::OAUTH_STATE, &state_token, cookies::STATE_TTL_SECS)
            .parse()
            .unwrap(),
    );
    out.insert(header::LOCATION, auth_url.parse().unwrap());

    Ok((StatusCode::FOUND, out))
}

/// `GET /api/auth/callback` — validates the provider's response, exchanges
/// the authorization code for tokens (with retry), and renders an HTML
/// page carrying the diagnostic log trail either way.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let mut log: Vec<String> = Vec::new();
    let push = |log: &mut Vec<String>, line: String| {
        info!("{line}");
        log.push(line);
    };

    push(&mut log, format!("callback invoked at {}", Utc::now().to_rfc3339()));

    if let Some(err) = &query.error {
        push(&mut log, format!("provider returned an error: {err}"));
        return error_page(&format!("Authorization error: {err}"), &log);
    }

    let Some(code) = query.code.as_deref() else {
        push(&mut log, "no authorization code received".to_string());
        return error_page("No authorization code received", &log);
    };

    // The state echo must match the cookie set at login; a mismatched or
    // missing state aborts the callback.
    let stored_state = cookies::get(&headers, cookies::OAUTH_STATE);
    match (query.state.as_deref(), stored_state.as_deref()) {
        (Some(returned), Some(stored)) if returned == stored => {
            push(&mut log, "state token verified".to_string());
        }
        (returned, _) => {
            warn!(?returned, "state verification failed");
            push(&mut log, "state verification failed".to_string());
            return error_page("State verification failed", &log);
        }
    }

    if state.settings.oauth.client_id.is_empty() {
        push(&mut log, "no client id configured".to_string());
        return error_page("Missing OAuth configuration: client id", &log);
    }

    let redirect_uri = callback_url(&state.settings, &headers);
    push(&mut log, format!("using callback URL: {redirect_uri}"));

    let policy = RetryPolicy::new(
        state.settings.oauth.retry_max_attempts,
        Duration::from_millis(state.settings.oauth.retry_base_delay_ms),
    );

    let oauth = &state.oauth;
    let graph = &state.graph;
    let redirect_uri_ref = redirect_uri.as_str();
    let outcome = policy
        .run(|attempt| async move {
            debug!(attempt, "requesting access token");
            let tokens = oauth
                .exchange_code(code, redirect_uri_ref)
                .await
                .map_err(|e| format!("token exchange failed: {e}"))?;
            let profile = graph
                .fetch_profile(&tokens.access_token)
                .await
                .map_err(|e| format!("user profile fetch failed: {e}"))?;
            Ok::<_, String>((tokens, profile))
        })
        .await;

    match outcome {
        RetryOutcome::Success {
            value: (tokens, profile),
            attempts,
            failures,
        } => {
            for (i, failure) in failures.iter().enumerate() {
                push(&mut log, format!("attempt {}/{} failed: {failure}", i + 1, policy.max_attempts));
            }
            push(&mut log, format!("access token obtained on attempt {attempts}/{}", policy.max_attempts));
            push(&mut log, format!("signed in as {}", profile.display_name));

            let mut out = HeaderMap::new();
            out.append(
                header::SET_COOKIE,
                cookies::set(cookies::ACCESS_TOKEN, &tokens.access_token, tokens.expires_in)
                    .parse()
                    .unwrap(),
            );
            if let Some(refresh_token) = &tokens.refresh_token {
                out.append(
                    header::SET_COOKIE,
                    cookies::set(cookies::REFRESH_TOKEN, refresh_token, cookies::REFRESH_TTL_SECS)
                        .parse()
                        .unwrap(),
                );
            }
            push(&mut log, "session cookies set".to_string());

            (out, Html(render_success_page(&profile, &log))).into_response()
        }
        RetryOutcome::Exhausted { failures } => {
            for (i, failure) in failures.iter().enumerate() {
                push(&mut log, format!("attempt {}/{} failed: {failure}", i + 1, policy.max_attempts));
                if (i as u32) < policy.max_attempts - 1 {
                    let delay = policy.delay_after(i as u32 + 1);
                    push(&mut log, format!("waited {}ms before retrying", delay.as_millis()));
                }
            }
            push(&mut log, "all retry attempts failed".to_string());
            error_page("Failed to obtain an access token, please try again later", &log)
        }
    }
}

/// `GET /api/auth/me` — resolves the current user against the identity
/// API. A 401 from the remote side clears the session cookies.
pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UserProfile>, ApiError> {
    let mut profile = state.graph.fetch_profile(&session.access_token).await?;

    // Best effort; a missing photo never fails the identity call.
    match state.graph.fetch_photo(&session.access_token).await {
        Ok(photo) => profile.photo = Some(photo),
        Err(e) => debug!("profile photo fetch failed (non-critical): {e}"),
    }

    Ok(Json(profile))
}

/// `POST /api/auth/logout` — clears every auth cookie. Always reports
/// success: the browser-side state is gone regardless of anything else.
pub async fn logout() -> (HeaderMap, Json<LogoutResponse>) {
    let mut headers = HeaderMap::new();
    for name in [cookies::ACCESS_TOKEN, cookies::REFRESH_TOKEN, cookies::OAUTH_STATE] {
        headers.append(header::SET_COOKIE, cookies::clear(name).parse().unwrap());
    }

    (
        headers,
        Json(LogoutResponse {
            success: true,
            message: "Signed out, all session cookies cleared".to_string(),
        }),
    )
}

/// `GET /api/auth/env-info` — configuration snapshot for debugging.
/// Secret values are reported only as present / absent.
pub async fn env_info(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let settings = &state.settings;

    Json(serde_json::json!({
        "clientId": display_or_unset(&settings.oauth.client_id),
        "clientSecretSet": !settings.oauth.client_secret.is_empty(),
        "redirectUri": settings.oauth.redirect_uri.clone().unwrap_or_else(|| "not set".to_string()),
        "scopes": settings.oauth.scopes,
        "authorizeUrl": settings.oauth.authorize_url,
        "graphBaseUrl": settings.graph.base_url,
        "baseUrl": settings.app.base_url,
        "port": settings.app.port,
        "requestHost": headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown"),
    }))
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() { "not set" } else { value }
}

/// The callback URL must match the one used in the authorization
/// redirect exactly. Configured value wins; otherwise it is derived from
/// the request's Host header.
fn callback_url(settings: &Settings, headers: &HeaderMap) -> String {
    if let Some(uri) = &settings.oauth.redirect_uri {
        return uri.clone();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost:3000");
    let protocol = if host.contains("localhost") || host.starts_with("127.") {
        "http"
    } else {
        "https"
    };
    format!("{protocol}://{host}/api/auth/callback")
}

fn render_success_page(profile: &UserProfile, log: &[String]) -> String {
    // The page is the hand-off point to the browser: it persists the user
    // projection (never the tokens) and then navigates home.
    let user_json = serde_json::to_string(profile).unwrap_or_else(|_| "null".to_string());

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Signed in</title>
    <meta charset="utf-8">
    <script>
      const user = {user_json};
      localStorage.setItem('driveview-user', JSON.stringify(user));
      setTimeout(() => {{ window.location.href = '/?auth=success'; }}, 5000);
    </script>
  </head>
  <body>
    <h1>Signed in</h1>
    <p><strong>{name}</strong> ({email})</p>
    <p>Redirecting to the file browser in 5 seconds...</p>
    {log}
  </body>
</html>
"#,
        name = escape_html(&profile.display_name),
        email = escape_html(&profile.email),
        log = render_log(log),
    )
}

fn error_page(message: &str, log: &[String]) -> Response {
    let body = format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Sign-in failed</title>
    <meta charset="utf-8">
    <script>
      setTimeout(() => {{ window.location.href = '/?auth=failed'; }}, 10000);
    </script>
  </head>
  <body>
    <h1>Sign-in failed</h1>
    <p><strong>Error:</strong> {message}</p>
    <p><a href="/api/auth/login">Try again</a> or <a href="/">go back</a>. Redirecting in 10 seconds...</p>
    {log}
  </body>
</html>
"#,
        message = escape_html(message),
        log = render_log(log),
    );

    (StatusCode::BAD_REQUEST, Html(body)).into_response()
}

fn render_log(log: &[String]) -> String {
    let lines: String = log
        .iter()
        .map(|line| format!("      <div>{}</div>\n", escape_html(line)))
        .collect();
    format!("<details>\n      <summary>Diagnostic log</summary>\n{lines}    </details>")
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
