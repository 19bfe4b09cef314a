//! Event gallery: image reachability checks, the paginated view-model and downloads.

mod download;
mod validator;
mod view;

pub use download::{default_file_name, DownloadError, DownloadOutcome, Downloader};
pub use validator::{
    candidates_for, Candidate, ReachabilityValidator, ValidatedImage, ValidationUpdate,
    DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE, DEFAULT_PROBE_TIMEOUT,
};
pub use view::{GalleryView, DEFAULT_PAGE_SIZE};
