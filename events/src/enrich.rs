use drive_client::{DriveClient, DriveUrls};

use crate::{extract_folder_id, is_placeholder_image, EventStub, ResolvedEvent};

/// Look up the event's Drive folder and fill in its gallery.
///
/// Never fails: curated events, events without a usable folder and
/// folders with no images come back unchanged.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip_all, fields(event = %stub.title)))]
pub async fn enrich_event(client: &DriveClient, urls: &DriveUrls, stub: &EventStub) -> ResolvedEvent {
    if stub.is_curated() {
        return ResolvedEvent::from(stub.clone());
    }

    let folder_id = stub
        .drive_folder_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .or_else(|| stub.drive_folder_link.as_deref().and_then(extract_folder_id));

    let Some(folder_id) = folder_id else {
        tracing::warn!(event = %stub.title, "Event has no usable Drive folder id or link");
        return ResolvedEvent::from(stub.clone());
    };

    let files = client.list_folder_images(&folder_id).await;
    if files.is_empty() {
        tracing::warn!(event = %stub.title, folder_id = %folder_id, "No images found in event folder");
        return ResolvedEvent::from(stub.clone());
    }

    let (images, drive_image_ids) = urls.resolve_images(&files);

    let has_custom_preview = !stub.preview_image.is_empty() && !is_placeholder_image(&stub.preview_image);
    let preview_image = if has_custom_preview {
        stub.preview_image.clone()
    } else {
        images
            .first()
            .cloned()
            .unwrap_or_else(|| stub.preview_image.clone())
    };

    tracing::info!(
        event = %stub.title,
        images = images.len(),
        ids = drive_image_ids.len(),
        "Resolved event gallery"
    );

    ResolvedEvent {
        drive_folder_id: Some(folder_id),
        drive_image_ids,
        preview_image,
        images,
        ..ResolvedEvent::from(stub.clone())
    }
}
