use driveview_api::{build_router, state::AppState};
use driveview_config::{AppSettings, GraphSettings, OAuthSettings, Settings};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A running test application whose identity provider and drive API are
/// both played by one wiremock server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub settings: Settings,
    pub client: reqwest::Client,
    pub remote: MockServer,
}

impl TestApp {
    /// Spawn a test server on a random port, pointed at a fresh mock
    /// remote.
    pub async fn spawn() -> Self {
        Self::spawn_with_settings(|_| {}).await
    }

    /// Spawn with customized settings. The `mutator` closure receives the
    /// test defaults (already pointed at the mock remote).
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        let remote = MockServer::start().await;
        let mut settings = test_settings(&remote.uri());
        mutator(&mut settings);

        let app_state = AppState::new(settings.clone());
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        // Cookie-store client with redirects disabled, so OAuth Location
        // headers and Set-Cookie responses can be asserted directly.
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            settings,
            client,
            remote,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Hits the login endpoint and returns the state nonce it set, with
    /// the `oauth_state` cookie left in the client's cookie store.
    pub async fn begin_login(&self) -> String {
        let resp = self
            .client
            .get(self.url("/api/auth/login"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 302);
        state_cookie_value(&resp)
    }

    /// Drives the whole login flow against the mock provider, leaving
    /// valid session cookies in the client's cookie store.
    pub async fn sign_in(&self) {
        mount_token_endpoint(&self.remote).await;
        mount_profile_endpoint_once(&self.remote).await;

        let state = self.begin_login().await;
        let resp = self
            .client
            .get(self.url(&format!("/api/auth/callback?code=test-code&state={state}")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200, "sign-in callback should succeed");
    }
}

pub fn state_cookie_value(resp: &reqwest::Response) -> String {
    set_cookies(resp)
        .iter()
        .find_map(|cookie| {
            cookie
                .strip_prefix("oauth_state=")
                .map(|rest| rest.split(';').next().unwrap_or(rest).to_string())
        })
        .expect("login response should set the oauth_state cookie")
}

/// All Set-Cookie header values of a response.
pub fn set_cookies(resp: &reqwest::Response) -> Vec<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

fn test_settings(remote_uri: &str) -> Settings {
    Settings {
        app: AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
        },
        oauth: OAuthSettings {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: None,
            scopes: "files.read,files.read.all,sites.read.all".to_string(),
            authorize_url: format!("{remote_uri}/oauth/authorize"),
            token_url: format!("{remote_uri}/oauth/token"),
            retry_max_attempts: 3,
            // Keep retry waits out of the test wall clock.
            retry_base_delay_ms: 10,
        },
        graph: GraphSettings {
            base_url: remote_uri.to_string(),
            user_fetch_timeout_secs: 10,
        },
    }
}

/// Token endpoint returning a fixed token pair.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "test-access-token",
            "refresh_token": "test-refresh-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

/// Identity endpoint returning a fixed profile.
pub async fn mount_profile_endpoint(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(profile_response())
        .mount(server)
        .await;
}

/// Identity endpoint that answers exactly once (enough for the callback's
/// profile fetch); later `/me` behavior stays up to the test.
pub async fn mount_profile_endpoint_once(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(profile_response())
        .up_to_n_times(1)
        .mount(server)
        .await;
}

fn profile_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "user-001",
        "displayName": "Test User",
        "userPrincipalName": "test.user@example.com"
    }))
}
