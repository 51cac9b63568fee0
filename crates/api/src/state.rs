use driveview_config::Settings;
use driveview_services::{GraphClient, ListingGateway, OAuthFlow};
use std::sync::Arc;
use std::time::Duration;

/// Explicit application context handed to every handler. Built once at
/// startup, torn down with the process; no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub oauth: Arc<OAuthFlow>,
    pub graph: Arc<GraphClient>,
    pub listings: Arc<ListingGateway>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let oauth = Arc::new(OAuthFlow::new(&settings.oauth));
        let graph = Arc::new(
            GraphClient::with_base_url(&settings.graph.base_url).with_user_fetch_timeout(
                Duration::from_secs(settings.graph.user_fetch_timeout_secs),
            ),
        );
        let listings = Arc::new(ListingGateway::new(graph.clone()));

        Self {
            settings,
            oauth,
            graph,
            listings,
        }
    }
}
