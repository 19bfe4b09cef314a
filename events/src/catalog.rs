use drive_client::{DriveClient, DriveUrls};
use futures::future::join_all;
use tokio::sync::OnceCell;

use crate::{enrich_event, sort_newest_first, EventStub, ResolvedEvent};

/// The site's events, enriched once per process.
///
/// Callers must run [`EventCatalog::initialize`] before relying on resolved
/// galleries; until then [`EventCatalog::events`] serves the bare stubs.
pub struct EventCatalog {
    stubs: Vec<EventStub>,
    resolved: OnceCell<Vec<ResolvedEvent>>,
}

impl EventCatalog {
    pub fn new(stubs: Vec<EventStub>) -> Self {
        Self {
            stubs,
            resolved: OnceCell::new(),
        }
    }

    /// Enrich every stub concurrently. Only the first call does any work;
    /// concurrent callers wait for it and later callers get the memo.
    pub async fn initialize(&self, client: &DriveClient, urls: &DriveUrls) -> &[ResolvedEvent] {
        self.resolved
            .get_or_init(|| async {
                tracing::info!(count = self.stubs.len(), "Resolving event galleries");
                join_all(self.stubs.iter().map(|stub| enrich_event(client, urls, stub))).await
            })
            .await
    }

    pub fn is_ready(&self) -> bool {
        self.resolved.initialized()
    }

    pub fn events(&self) -> Vec<ResolvedEvent> {
        match self.resolved.get() {
            Some(resolved) => resolved.clone(),
            None => self.stubs.iter().cloned().map(ResolvedEvent::from).collect(),
        }
    }

    pub fn sorted_newest_first(&self) -> Vec<ResolvedEvent> {
        sort_newest_first(&self.events())
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<ResolvedEvent> {
        self.events().into_iter().find(|e| e.slug() == slug)
    }
}
