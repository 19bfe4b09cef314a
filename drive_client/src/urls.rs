//! Display and download URL templates for Drive-hosted images.

use crate::DriveFile;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

const DEFAULT_WEB_BASE: &str = "https://drive.google.com";
const LARGE_THUMBNAIL_SIZE: &str = "=s2000";

static THUMBNAIL_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"=s\d+").expect("valid size regex"));

/// Builds the URLs the gallery uses to show and download a Drive file.
#[derive(Debug, Clone)]
pub struct DriveUrls {
    base: String,
}

impl Default for DriveUrls {
    fn default() -> Self {
        Self::with_base(DEFAULT_WEB_BASE)
    }
}

impl DriveUrls {
    /// Use a custom web base instead of `drive.google.com`. Mainly used for testing.
    pub fn with_base(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn view_url(&self, file_id: &str) -> String {
        format!("{}/uc?export=view&id={}", self.base, file_id)
    }

    pub fn download_url(&self, file_id: &str) -> String {
        format!("{}/uc?export=download&id={}", self.base, file_id)
    }

    /// Alternates tried, in order, when a file's display URL does not load.
    pub fn fallback_urls(&self, file_id: &str) -> Vec<String> {
        vec![
            format!("{}/thumbnail?id={}&sz=w2000", self.base, file_id),
            self.download_url(file_id),
        ]
    }

    /// Best single display URL for `file`: content link, then upsized
    /// thumbnail, then the synthetic view URL.
    pub fn display_url(&self, file: &DriveFile) -> String {
        if let Some(link) = file.web_content_link.as_deref().filter(|l| !l.is_empty()) {
            return view_intent(link);
        }
        if let Some(link) = file.thumbnail_link.as_deref().filter(|l| !l.is_empty()) {
            return THUMBNAIL_SIZE.replace(link, LARGE_THUMBNAIL_SIZE).into_owned();
        }
        self.view_url(&file.id)
    }

    /// Resolve one display URL per file. Returns the URLs and the file ids
    /// that produced them, index-aligned. A file whose URL was already
    /// produced by an earlier file is skipped.
    pub fn resolve_images(&self, files: &[DriveFile]) -> (Vec<String>, Vec<String>) {
        let mut images = Vec::with_capacity(files.len());
        let mut ids = Vec::with_capacity(files.len());
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for file in files {
            let url = self.display_url(file);
            if seen_urls.contains(&url) {
                tracing::warn!(file = %file.name, id = %file.id, "Skipping duplicate image URL");
                continue;
            }
            if !seen_ids.insert(file.id.as_str()) {
                continue;
            }
            tracing::debug!(file = %file.name, id = %file.id, "Adding image");
            seen_urls.insert(url.clone());
            images.push(url);
            ids.push(file.id.clone());
        }

        (images, ids)
    }
}

fn view_intent(link: &str) -> String {
    let mut url = link
        .replace("&export=download", "")
        .replace("export=download", "export=view");
    if !url.contains("export=") {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str("export=view");
    }
    url
}
