//! API client module for Google Drive folder listings.

mod natural;
pub mod urls;

pub use natural::natural_cmp;
pub use urls::DriveUrls;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const PAGE_SIZE: u32 = 1000;
const FILE_FIELDS: &str = "nextPageToken,files(id,name,mimeType,webContentLink,thumbnailLink)";
const IMAGE_MIME_PREFIX: &str = "image/";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    pub web_content_link: Option<String>,
    pub thumbnail_link: Option<String>,
}

impl DriveFile {
    fn is_listable_image(&self) -> bool {
        self.mime_type.starts_with(IMAGE_MIME_PREFIX) && !self.name.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilesResponse {
    files: Option<Vec<DriveFile>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum DriveClientError {
    #[error("Drive API key is not configured")]
    MissingApiKey,
    #[error("Request Error: {0}")]
    RequestError(String),
    #[error("Drive API Error ({status}): {body}")]
    DriveApiError { status: u16, body: String },
    #[error("Decode Error: {0}")]
    DecodeError(String),
}

#[derive(Debug, Clone)]
pub struct DriveClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl DriveClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create a new client with a custom API base URL. Mainly used for testing.
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        DriveClient {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch a single page of image files inside `folder_id`.
    pub async fn list_files_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<DriveFile>, Option<String>), DriveClientError> {
        let api_key = self.api_key.as_deref().ok_or(DriveClientError::MissingApiKey)?;
        let url = format!("{}/drive/v3/files", self.base_url);
        let query = format!(
            "'{}' in parents and trashed=false and mimeType contains '{}'",
            folder_id, IMAGE_MIME_PREFIX
        );
        let page_size = PAGE_SIZE.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("q", query.as_str()),
            ("fields", FILE_FIELDS),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        params.push(("key", api_key));

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| DriveClientError::RequestError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DriveClientError::DriveApiError {
                status: status.as_u16(),
                body,
            });
        }

        let list_response = response
            .json::<ListFilesResponse>()
            .await
            .map_err(|e| DriveClientError::DecodeError(e.to_string()))?;

        Ok((
            list_response.files.unwrap_or_default(),
            list_response.next_page_token,
        ))
    }

    /// Walk every page of `folder_id` and return the filtered, deduplicated
    /// image files sorted by name.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn try_list_folder_images(
        &self,
        folder_id: &str,
    ) -> Result<Vec<DriveFile>, DriveClientError> {
        let mut files: Vec<DriveFile> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let (page, next_page_token) = self
                .list_files_page(folder_id, page_token.as_deref())
                .await?;
            pages += 1;

            if page.is_empty() {
                tracing::warn!(folder_id, page = pages, "Drive returned no files for page");
            }

            let mut page_seen: HashSet<&str> = HashSet::new();
            let unique: Vec<&DriveFile> = page
                .iter()
                .filter(|f| f.is_listable_image())
                .filter(|f| page_seen.insert(f.id.as_str()))
                .collect();
            tracing::debug!(folder_id, count = unique.len(), "Unique image files in page");

            for file in unique {
                if seen.insert(file.id.clone()) {
                    files.push(file.clone());
                }
            }

            match next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        files.sort_by(|a, b| natural_cmp(&a.name, &b.name));
        tracing::info!(
            folder_id,
            pages,
            count = files.len(),
            "Listed unique image files in Drive folder"
        );
        Ok(files)
    }

    /// Lenient listing: any failure is logged and yields an empty list.
    pub async fn list_folder_images(&self, folder_id: &str) -> Vec<DriveFile> {
        match self.try_list_folder_images(folder_id).await {
            Ok(files) => files,
            Err(DriveClientError::MissingApiKey) => {
                tracing::warn!("Drive API key not configured; set DRIVE_API_KEY to enable event galleries");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(folder_id, error = %e, "Failed to list Drive folder");
                Vec::new()
            }
        }
    }
}
