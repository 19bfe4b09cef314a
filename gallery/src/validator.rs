use drive_client::DriveUrls;
use events::{is_placeholder_image, ResolvedEvent};
use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(50);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// An image URL waiting to be checked, with the Drive file behind it if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    pub url: String,
    pub file_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ValidationUpdate {
    Started {
        generation: u64,
        total: usize,
    },
    Batch {
        generation: u64,
        images: Vec<ValidatedImage>,
        checked: usize,
        total: usize,
        first: bool,
    },
    Finished {
        generation: u64,
        valid: usize,
    },
}

impl ValidationUpdate {
    pub fn generation(&self) -> u64 {
        match self {
            ValidationUpdate::Started { generation, .. }
            | ValidationUpdate::Batch { generation, .. }
            | ValidationUpdate::Finished { generation, .. } => *generation,
        }
    }
}

/// Gallery candidates for `event`, skipping blank and placeholder URLs.
pub fn candidates_for(event: &ResolvedEvent) -> Vec<Candidate> {
    event
        .images
        .iter()
        .enumerate()
        .filter(|(_, url)| !url.trim().is_empty() && !is_placeholder_image(url))
        .map(|(i, url)| Candidate {
            url: url.clone(),
            file_id: event.drive_image_ids.get(i).cloned(),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ReachabilityValidator {
    client: reqwest::Client,
    urls: DriveUrls,
    batch_size: usize,
    batch_delay: Duration,
    probe_timeout: Option<Duration>,
}

impl ReachabilityValidator {
    pub fn new(urls: DriveUrls) -> Self {
        Self::with_timeout(urls, DEFAULT_PROBE_TIMEOUT)
    }

    /// Bound every probe by `timeout`.
    pub fn with_timeout(urls: DriveUrls, timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Failed to build probe client; probing with a per-request timeout"
                );
                reqwest::Client::new()
            }
        };
        Self::with_client(urls, client).probe_timeout(timeout)
    }

    /// Use a preconfigured client; its timeout bounds every probe.
    pub fn with_client(urls: DriveUrls, client: reqwest::Client) -> Self {
        Self {
            client,
            urls,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            probe_timeout: None,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Per-request timeout applied on top of the client's own.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// GET `url` and report whether it serves something other than an HTML page.
    pub async fn probe(&self, url: &str) -> bool {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.probe_timeout {
            request = request.timeout(timeout);
        }
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url, error = %e, "Image probe failed");
                return false;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(url, status = %response.status(), "Image probe rejected");
            return false;
        }
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(false);
        if is_html {
            tracing::debug!(url, "Image probe returned an HTML page");
        }
        !is_html
    }

    async fn validate_candidate(&self, candidate: &Candidate) -> Option<ValidatedImage> {
        if self.probe(&candidate.url).await {
            return Some(ValidatedImage {
                url: candidate.url.clone(),
                file_id: candidate.file_id.clone(),
            });
        }

        let Some(file_id) = candidate.file_id.as_deref() else {
            tracing::warn!(url = %candidate.url, "Dropping unreachable image");
            return None;
        };

        for alternate in self.urls.fallback_urls(file_id) {
            if self.probe(&alternate).await {
                tracing::debug!(file_id, url = %alternate, "Image reachable through fallback URL");
                return Some(ValidatedImage {
                    url: alternate,
                    file_id: Some(file_id.to_string()),
                });
            }
        }

        tracing::warn!(file_id, url = %candidate.url, "Dropping image after exhausting fallbacks");
        None
    }

    /// Probe one batch concurrently. Survivors keep their input order.
    pub async fn validate_batch(&self, batch: &[Candidate]) -> Vec<ValidatedImage> {
        join_all(batch.iter().map(|c| self.validate_candidate(c)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Validate `candidates` batch by batch, publishing each batch on `tx`.
    ///
    /// Stops early once the receiving gallery has gone away.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, candidates, tx)))]
    pub async fn run(
        &self,
        generation: u64,
        candidates: Vec<Candidate>,
        tx: mpsc::UnboundedSender<ValidationUpdate>,
    ) -> Vec<ValidatedImage> {
        let start = Instant::now();
        let total = candidates.len();
        let mut validated = Vec::new();

        if tx.send(ValidationUpdate::Started { generation, total }).is_err() {
            return validated;
        }

        for (index, batch) in candidates.chunks(self.batch_size).enumerate() {
            if index > 0 {
                sleep(self.batch_delay).await;
            }
            let images = self.validate_batch(batch).await;
            let checked = (index * self.batch_size + batch.len()).min(total);
            validated.extend(images.iter().cloned());

            let update = ValidationUpdate::Batch {
                generation,
                images,
                checked,
                total,
                first: index == 0,
            };
            if tx.send(update).is_err() {
                tracing::debug!(generation, checked, total, "Gallery closed; stopping validation");
                return validated;
            }
        }

        let _ = tx.send(ValidationUpdate::Finished {
            generation,
            valid: validated.len(),
        });
        tracing::info!(
            "validation_time_ms" = %start.elapsed().as_millis(),
            generation,
            total,
            valid = validated.len(),
            "Finished validating gallery"
        );
        validated
    }

    /// Run [`ReachabilityValidator::run`] on its own task.
    pub fn spawn(
        &self,
        generation: u64,
        candidates: Vec<Candidate>,
        tx: mpsc::UnboundedSender<ValidationUpdate>,
    ) -> JoinHandle<Vec<ValidatedImage>> {
        let validator = self.clone();
        tokio::spawn(async move { validator.run(generation, candidates, tx).await })
    }
}
