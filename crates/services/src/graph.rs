use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("access token rejected by the drive API")]
    Unauthorized,
    #[error("drive API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("drive API request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Identity projection exposed to the browser. The access token itself
/// never travels alongside it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "userPrincipalName")]
    user_principal_name: Option<String>,
    mail: Option<String>,
}

/// Raw drive item as the remote API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "lastModifiedDateTime")]
    pub last_modified: Option<String>,
    /// Folder facet. Presence marks the item as a folder.
    pub folder: Option<serde_json::Value>,
    pub file: Option<FileFacet>,
    #[serde(rename = "@microsoft.graph.downloadUrl")]
    pub download_url: Option<String>,
    #[serde(rename = "webUrl")]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileFacet {
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
}

/// One window of a listing or search response.
#[derive(Debug, Deserialize)]
pub struct DriveItemPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Normalized file entry served to the browser.
///
/// A folder never carries a download URL; the two are mutually exclusive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub last_modified: Option<String>,
    pub mime_type: String,
    pub is_folder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl From<DriveItem> for FileEntry {
    fn from(item: DriveItem) -> Self {
        let is_folder = item.folder.is_some();
        let mime_type = if is_folder {
            "folder".to_string()
        } else {
            item.file
                .as_ref()
                .and_then(|f| f.mime_type.clone())
                .unwrap_or_else(|| "application/octet-stream".to_string())
        };

        FileEntry {
            id: item.id,
            name: item.name,
            size: item.size,
            last_modified: item.last_modified,
            mime_type,
            is_folder,
            download_url: if is_folder { None } else { item.download_url },
            view_url: item.web_url,
            embed_url: None,
            thumbnail_url: None,
        }
    }
}

/// Thin client for the remote Graph-style drive API.
///
/// Holds no token; every call takes the caller's access token, so one
/// client instance serves all sessions.
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    user_fetch_timeout: Duration,
}

impl GraphClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            user_fetch_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_user_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.user_fetch_timeout = timeout;
        self
    }

    /// Fetches the signed-in user's identity.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile, GraphError> {
        let resp = self
            .client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(access_token)
            .timeout(self.user_fetch_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let raw: RawProfile = resp.json().await?;

        Ok(UserProfile {
            id: raw.id,
            display_name: raw.display_name.unwrap_or_default(),
            email: raw
                .user_principal_name
                .or(raw.mail)
                .unwrap_or_default(),
            photo: None,
        })
    }

    /// Fetches the user's profile photo as a base64 data URL.
    pub async fn fetch_photo(&self, access_token: &str) -> Result<String, GraphError> {
        let resp = self
            .client
            .get(format!("{}/me/photo/$value", self.base_url))
            .bearer_auth(access_token)
            .timeout(self.user_fetch_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = resp.bytes().await?;

        Ok(format!("data:{};base64,{}", content_type, BASE64.encode(&bytes)))
    }

    /// Lists the direct children of a folder path. `/` (or empty) lists
    /// the drive root.
    pub async fn list_children(
        &self,
        access_token: &str,
        path: &str,
        top: u32,
        skiptoken: Option<&str>,
    ) -> Result<DriveItemPage, GraphError> {
        let url = if path == "/" || path.is_empty() {
            format!("{}/me/drive/root/children", self.base_url)
        } else {
            let clean_path = path.trim_start_matches('/');
            format!(
                "{}/me/drive/root:/{}:/children",
                self.base_url,
                urlencoding::encode(clean_path)
            )
        };
        self.fetch_page(access_token, &url, Some(top), skiptoken).await
    }

    /// Full-text search scoped to the drive root.
    pub async fn search(
        &self,
        access_token: &str,
        query: &str,
        top: Option<u32>,
        skiptoken: Option<&str>,
    ) -> Result<DriveItemPage, GraphError> {
        let url = format!(
            "{}/me/drive/root/search(q='{}')",
            self.base_url,
            urlencoding::encode(query)
        );
        self.fetch_page(access_token, &url, top, skiptoken).await
    }

    async fn fetch_page(
        &self,
        access_token: &str,
        url: &str,
        top: Option<u32>,
        skiptoken: Option<&str>,
    ) -> Result<DriveItemPage, GraphError> {
        // The skiptoken comes back percent-encoded inside the nextLink;
        // the query string is assembled by hand so it is passed through
        // verbatim rather than encoded a second time.
        let mut url = url.to_string();
        let mut params: Vec<String> = Vec::new();
        if let Some(top) = top {
            params.push(format!("$top={top}&$orderby=name"));
        }
        if let Some(token) = skiptoken {
            params.push(format!("$skiptoken={token}"));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        let resp = self.client.get(url).bearer_auth(access_token).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Fetches a single item's metadata.
    pub async fn get_item(
        &self,
        access_token: &str,
        item_id: &str,
    ) -> Result<DriveItem, GraphError> {
        let resp = self
            .client
            .get(format!("{}/me/drive/items/{}", self.base_url, item_id))
            .bearer_auth(access_token)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Returns the large-thumbnail URL for an item, when one exists.
    pub async fn thumbnail_url(
        &self,
        access_token: &str,
        item_id: &str,
    ) -> Result<Option<String>, GraphError> {
        let resp = self
            .client
            .get(format!(
                "{}/me/drive/items/{}/thumbnails",
                self.base_url, item_id
            ))
            .bearer_auth(access_token)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let json: serde_json::Value = resp.json().await?;

        Ok(json["value"]
            .get(0)
            .and_then(|set| set["large"]["url"].as_str())
            .map(|s| s.to_string()))
    }

    /// Downloads raw content from a pre-authenticated download URL.
    /// Returns the bytes and the upstream content type.
    pub async fn download(&self, url: &str) -> Result<(Vec<u8>, Option<String>), GraphError> {
        let resp = check_status(self.client.get(url).send().await?).await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = resp.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }
}

impl Default for GraphClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GraphError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GraphError::Unauthorized);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GraphError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}
