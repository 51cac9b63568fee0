pub mod bundle;
pub mod graph;
pub mod listing;
pub mod oauth;
pub mod preview;
pub mod retry;

pub use graph::{DriveItem, FileEntry, GraphClient, GraphError, UserProfile};
pub use listing::{CursorCache, CursorKey, FileListing, ListingGateway, ListingScope, ViewSequence};
pub use oauth::{OAuthError, OAuthFlow, OAuthTokens};
pub use preview::{PreviewKind, classify, describe_file_type, format_file_size};
pub use retry::{RetryOutcome, RetryPolicy};
