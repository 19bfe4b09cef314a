use std::collections::HashMap;

use crate::ValidationUpdate;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// State behind one open event gallery.
///
/// `validated` only grows while the same event stays open, and the visible
/// window is always a prefix-sized slice of it. Opening an event resets
/// everything and bumps the generation, so updates from a validation run
/// started for a previous event are ignored.
#[derive(Debug, Clone)]
pub struct GalleryView {
    page_size: usize,
    generation: u64,
    event_id: Option<String>,
    validated: Vec<String>,
    file_ids: HashMap<String, String>,
    visible: Vec<String>,
    loaded: usize,
    loading: bool,
    checked: usize,
    total: usize,
    selected: Option<usize>,
}

impl Default for GalleryView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl GalleryView {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            generation: 0,
            event_id: None,
            validated: Vec::new(),
            file_ids: HashMap::new(),
            visible: Vec::new(),
            loaded: 0,
            loading: false,
            checked: 0,
            total: 0,
            selected: None,
        }
    }

    /// Start showing `event_id`. Returns the generation that validation
    /// updates for this event must carry.
    pub fn open(&mut self, event_id: &str) -> u64 {
        self.generation += 1;
        self.event_id = Some(event_id.to_string());
        self.validated.clear();
        self.file_ids.clear();
        self.visible.clear();
        self.loaded = 0;
        self.loading = true;
        self.checked = 0;
        self.total = 0;
        self.selected = None;
        tracing::debug!(event_id, generation = self.generation, "Opened gallery");
        self.generation
    }

    /// Fold a validation update into the view. Returns `false` for stale updates.
    pub fn apply(&mut self, update: ValidationUpdate) -> bool {
        if update.generation() != self.generation || self.event_id.is_none() {
            tracing::debug!(
                stale = update.generation(),
                current = self.generation,
                "Ignoring stale validation update"
            );
            return false;
        }

        match update {
            ValidationUpdate::Started { total, .. } => {
                self.total = total;
            }
            ValidationUpdate::Batch {
                images,
                checked,
                total,
                first,
                ..
            } => {
                for image in images {
                    if let Some(file_id) = image.file_id {
                        self.file_ids.insert(image.url.clone(), file_id);
                    }
                    if !self.validated.contains(&image.url) {
                        self.validated.push(image.url);
                    }
                }
                self.checked = checked;
                self.total = total;
                if first {
                    let end = self.page_size.min(self.validated.len());
                    self.visible = self.validated[..end].to_vec();
                    self.loaded = end;
                    self.loading = false;
                }
            }
            ValidationUpdate::Finished { .. } => {
                self.loading = false;
            }
        }
        true
    }

    /// Scroll trigger: reveal the next page of validated images.
    pub fn load_more(&mut self) -> usize {
        if self.loading || self.loaded >= self.validated.len() {
            return self.loaded;
        }
        let end = (self.loaded + self.page_size).min(self.validated.len());
        for url in &self.validated[self.loaded..end] {
            if !self.visible.contains(url) {
                self.visible.push(url.clone());
            }
        }
        self.loaded = end;
        self.loaded
    }

    pub fn has_more(&self) -> bool {
        !self.loading && self.loaded < self.validated.len()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// `(checked, total)` candidates so far.
    pub fn progress(&self) -> (usize, usize) {
        (self.checked, self.total)
    }

    pub fn validated(&self) -> &[String] {
        &self.validated
    }

    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    pub fn file_id_for(&self, url: &str) -> Option<&str> {
        self.file_ids.get(url).map(String::as_str)
    }

    /// Open the lightbox on `url`, which may lie outside the visible window.
    pub fn select(&mut self, url: &str) -> Option<usize> {
        let index = self.validated.iter().position(|u| u == url)?;
        self.selected = Some(index);
        Some(index)
    }

    pub fn select_index(&mut self, index: usize) -> Option<&str> {
        if index >= self.validated.len() {
            return None;
        }
        self.selected = Some(index);
        Some(self.validated[index].as_str())
    }

    pub fn next(&mut self) -> Option<&str> {
        let len = self.validated.len();
        let current = self.selected?;
        if len == 0 {
            return None;
        }
        self.select_index((current + 1) % len)
    }

    pub fn prev(&mut self) -> Option<&str> {
        let len = self.validated.len();
        let current = self.selected?;
        if len == 0 {
            return None;
        }
        self.select_index((current + len - 1) % len)
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<(usize, &str)> {
        self.selected
            .and_then(|i| self.validated.get(i).map(|url| (i, url.as_str())))
    }
}
