use drive_client::DriveUrls;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use crate::GalleryView;

#[derive(Debug, Error, PartialEq)]
pub enum DownloadError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status: {0}")]
    Status(u16),
    #[error("provider returned an HTML page instead of an image")]
    HtmlResponse,
    #[error("io error: {0}")]
    Io(String),
    #[error("could not open browser: {0}")]
    Browser(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    OpenedExternally(String),
}

/// `foto-<unix millis>.jpg`
pub fn default_file_name() -> String {
    format!("foto-{}.jpg", chrono::Utc::now().timestamp_millis())
}

/// Saves gallery images, handing the URL to the system browser when a
/// direct fetch fails.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    urls: DriveUrls,
    open_browser: bool,
}

impl Downloader {
    pub fn new(urls: DriveUrls) -> Self {
        Self::with_client(urls, reqwest::Client::new())
    }

    pub fn with_client(urls: DriveUrls, client: reqwest::Client) -> Self {
        Self {
            client,
            urls,
            open_browser: true,
        }
    }

    /// Never hand the URL to a browser; report the error instead.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status().as_u16()));
        }
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(false);
        if is_html {
            return Err(DownloadError::HtmlResponse);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::Io(e.to_string()))?;
        }
        fs::write(dest, &bytes)
            .await
            .map_err(|e| DownloadError::Io(e.to_string()))
    }

    /// Download `image_url` (backed by Drive file `file_id`, if known) to `dest`.
    ///
    /// With a file id the Drive download URL is fetched, and on failure that
    /// same URL goes to the browser, which can follow Drive's scan-warning
    /// page. Without one the display URL is fetched and then opened.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn download(
        &self,
        image_url: &str,
        file_id: Option<&str>,
        dest: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        let target = match file_id {
            Some(id) => self.urls.download_url(id),
            None => image_url.to_string(),
        };

        let error = match self.fetch_to(&target, dest).await {
            Ok(()) => {
                tracing::info!(url = %target, file_id, path = ?dest, "Downloaded image");
                return Ok(DownloadOutcome::Saved(dest.to_path_buf()));
            }
            Err(e) => e,
        };
        tracing::warn!(url = %target, file_id, error = %error, "Failed to download image");

        if !self.open_browser {
            return Err(error);
        }
        webbrowser::open(&target).map_err(|e| DownloadError::Browser(e.to_string()))?;
        tracing::info!(url = %target, "Opened image in browser");
        Ok(DownloadOutcome::OpenedExternally(target))
    }

    /// Download the image currently open in the lightbox, if any.
    pub async fn download_selected(
        &self,
        view: &GalleryView,
        dest: &Path,
    ) -> Option<Result<DownloadOutcome, DownloadError>> {
        let (_, url) = view.selected()?;
        Some(self.download(url, view.file_id_for(url), dest).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ValidatedImage, ValidationUpdate};
    use httpmock::prelude::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_default_file_name() {
        let name = default_file_name();
        assert!(name.starts_with("foto-"));
        assert!(name.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_download_uses_drive_download_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/uc").query_param("export", "download").query_param("id", "f1");
            then.status(200).header("content-type", "image/jpeg").body("jpeg-bytes");
        });
        let dir = tempdir().unwrap();
        let dest = dir.path().join("photo.jpg");
        let dl = Downloader::new(DriveUrls::with_base(&server.base_url())).without_browser();

        let out = dl
            .download(&server.url("/display.jpg"), Some("f1"), &dest)
            .await
            .unwrap();
        assert_eq!(out, DownloadOutcome::Saved(dest.clone()));
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"jpeg-bytes");
        mock.assert();
    }

    #[tokio::test]
    async fn test_html_interstitial_is_not_saved() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/uc");
            then.status(200).header("content-type", "text/html").body("<html>scan warning</html>");
        });
        let display = server.mock(|when, then| {
            when.method(GET).path("/display.jpg");
            then.status(200).header("content-type", "image/jpeg").body("display-bytes");
        });
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested").join("photo.jpg");
        let dl = Downloader::new(DriveUrls::with_base(&server.base_url())).without_browser();

        let err = dl
            .download(&server.url("/display.jpg"), Some("f1"), &dest)
            .await
            .unwrap_err();
        assert_eq!(err, DownloadError::HtmlResponse);
        assert!(!dest.exists());
        display.assert_hits(0);
    }

    #[tokio::test]
    async fn test_without_file_id_fetches_display_url() {
        let server = MockServer::start();
        let display = server.mock(|when, then| {
            when.method(GET).path("/display.jpg");
            then.status(200).header("content-type", "image/jpeg").body("display-bytes");
        });
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested").join("photo.jpg");
        let dl = Downloader::new(DriveUrls::with_base(&server.base_url())).without_browser();

        dl.download(&server.url("/display.jpg"), None, &dest)
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"display-bytes");
        display.assert();
    }

    /// Point `BROWSER` at a script that appends each URL it gets to a file.
    #[cfg(unix)]
    fn recording_browser(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("opened.txt");
        let script = dir.join("browser.sh");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$1\" >> \"{}\"\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::env::set_var("BROWSER", &script);
        log
    }

    #[cfg(unix)]
    async fn opened_urls(log: &Path) -> String {
        for _ in 0..50 {
            if let Ok(content) = tokio::fs::read_to_string(log).await {
                if !content.is_empty() {
                    return content;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        String::new()
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_browser_gets_download_url_when_file_id_known() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/uc");
            then.status(200).header("content-type", "text/html").body("<html>scan warning</html>");
        });
        let display = server.mock(|when, then| {
            when.method(GET).path("/display.jpg");
            then.status(403);
        });
        let dir = tempdir().unwrap();
        let log = recording_browser(dir.path());
        let urls = DriveUrls::with_base(&server.base_url());
        let dl = Downloader::new(urls.clone());

        let out = dl
            .download(&server.url("/display.jpg"), Some("f1"), &dir.path().join("photo.jpg"))
            .await
            .unwrap();
        std::env::remove_var("BROWSER");

        assert_eq!(out, DownloadOutcome::OpenedExternally(urls.download_url("f1")));
        assert_eq!(opened_urls(&log).await.trim(), urls.download_url("f1"));
        display.assert_hits(0);
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_browser_gets_display_url_without_file_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/display.jpg");
            then.status(403);
        });
        let dir = tempdir().unwrap();
        let log = recording_browser(dir.path());
        let dl = Downloader::new(DriveUrls::with_base(&server.base_url()));

        let display_url = server.url("/display.jpg");
        let out = dl
            .download(&display_url, None, &dir.path().join("photo.jpg"))
            .await
            .unwrap();
        std::env::remove_var("BROWSER");

        assert_eq!(out, DownloadOutcome::OpenedExternally(display_url.clone()));
        assert_eq!(opened_urls(&log).await.trim(), display_url);
    }

    #[tokio::test]
    async fn test_failed_fetch_without_browser_reports_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.jpg");
            then.status(404);
        });
        let dir = tempdir().unwrap();
        let dest = dir.path().join("photo.jpg");
        let dl = Downloader::new(DriveUrls::with_base(&server.base_url())).without_browser();

        let err = dl
            .download(&server.url("/missing.jpg"), None, &dest)
            .await
            .unwrap_err();
        assert_eq!(err, DownloadError::Status(404));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_selected_uses_view_mapping() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/uc").query_param("id", "f9");
            then.status(200).header("content-type", "image/png").body("png");
        });
        let mut view = GalleryView::new(10);
        let generation = view.open("ev");
        view.apply(ValidationUpdate::Batch {
            generation,
            images: vec![ValidatedImage {
                url: server.url("/display.png"),
                file_id: Some("f9".into()),
            }],
            checked: 1,
            total: 1,
            first: true,
        });
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.png");
        let dl = Downloader::new(DriveUrls::with_base(&server.base_url())).without_browser();

        assert!(dl.download_selected(&view, &dest).await.is_none());
        view.select_index(0);
        let out = dl.download_selected(&view, &dest).await.unwrap().unwrap();
        assert_eq!(out, DownloadOutcome::Saved(dest));
        mock.assert();
    }
}
