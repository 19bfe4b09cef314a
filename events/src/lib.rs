//! Band events and their Drive-backed photo galleries.

mod catalog;
mod date;
mod enrich;
mod folder;
mod slug;

pub use catalog::EventCatalog;
pub use date::{parse_event_date, sort_newest_first};
pub use enrich::enrich_event;
pub use folder::extract_folder_id;
pub use slug::generate_slug;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Preview images shipped with the site that stand in for a real event photo.
const PLACEHOLDER_IMAGES: [&str; 2] = ["/images/general/geral-01.png", "/images/share/banda-completa"];

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse Error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// An authored event, before its gallery has been looked up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventStub {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub preview_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub drive_folder_id: Option<String>,
    #[serde(default)]
    pub drive_folder_link: Option<String>,
    #[serde(default)]
    pub drive_image_ids: Vec<String>,
}

impl EventStub {
    pub fn slug(&self) -> String {
        generate_slug(&self.title)
    }

    /// Curated events list their Drive image ids by hand and skip the lookup.
    pub fn is_curated(&self) -> bool {
        self.drive_image_ids
            .first()
            .map(|id| !id.contains("PLACEHOLDER"))
            .unwrap_or(false)
    }
}

/// An event with its gallery resolved to displayable URLs.
///
/// `drive_image_ids[i]` is the Drive file behind `images[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub preview_image: String,
    pub images: Vec<String>,
    pub drive_folder_id: Option<String>,
    pub drive_folder_link: Option<String>,
    pub drive_image_ids: Vec<String>,
}

impl From<EventStub> for ResolvedEvent {
    fn from(stub: EventStub) -> Self {
        ResolvedEvent {
            id: stub.id,
            title: stub.title,
            description: stub.description,
            date: stub.date,
            location: stub.location,
            preview_image: stub.preview_image,
            images: stub.images,
            drive_folder_id: stub.drive_folder_id,
            drive_folder_link: stub.drive_folder_link,
            drive_image_ids: stub.drive_image_ids,
        }
    }
}

impl ResolvedEvent {
    pub fn slug(&self) -> String {
        generate_slug(&self.title)
    }

    pub fn file_id_for(&self, url: &str) -> Option<&str> {
        self.images
            .iter()
            .position(|u| u == url)
            .and_then(|i| self.drive_image_ids.get(i))
            .map(String::as_str)
    }
}

pub fn is_placeholder_image(url: &str) -> bool {
    PLACEHOLDER_IMAGES.iter().any(|p| url.contains(p))
}

/// The band's authored event list.
pub fn default_events() -> Vec<EventStub> {
    vec![EventStub {
        id: "1".to_string(),
        title: "Aniversário de 1 ano Forró do Horizonte".to_string(),
        description: "Festa de comemoração de 1 ano de banda".to_string(),
        date: "17 de Maio, 2025".to_string(),
        location: "Faiska, Uberlândia - MG".to_string(),
        preview_image: "/images/events/cover/aniversario-1-ano.png".to_string(),
        images: Vec::new(),
        drive_folder_id: None,
        drive_folder_link: Some(
            "https://drive.google.com/drive/folders/1ABn_HMg9B3OzunBGxlNu19W96L_jAbe0".to_string(),
        ),
        drive_image_ids: Vec::new(),
    }]
}

#[derive(Deserialize)]
struct EventsFile {
    #[serde(default)]
    events: Vec<EventStub>,
}

/// Load stubs from a TOML file with one `[[events]]` table per event.
pub fn load_stubs(path: &Path) -> Result<Vec<EventStub>, EventsError> {
    let data = std::fs::read_to_string(path)?;
    let parsed: EventsFile = toml::from_str(&data)?;
    Ok(parsed.events)
}
