mod settings;

pub use settings::{AppSettings, GraphSettings, OAuthSettings, Settings};
