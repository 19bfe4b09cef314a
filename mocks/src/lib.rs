use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;

/// Create an empty mock server for Drive API and image endpoints.
pub fn drive_server() -> Server {
    Server::run()
}

/// JSON shape of a single Drive file entry.
pub fn drive_file(id: &str, name: &str, mime_type: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "mimeType": mime_type
    })
}

/// Same as [`drive_file`] with a thumbnail link.
pub fn drive_file_with_thumbnail(id: &str, name: &str, thumbnail: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "mimeType": "image/jpeg",
        "thumbnailLink": thumbnail
    })
}

fn files_body(files: Vec<serde_json::Value>, next_page_token: Option<&str>) -> serde_json::Value {
    json!({
        "files": files,
        "nextPageToken": next_page_token
    })
}

/// Expect the first page request (no `pageToken`) for `folder_id`.
pub fn expect_first_page(
    server: &Server,
    folder_id: &str,
    files: Vec<serde_json::Value>,
    next_page_token: Option<&str>,
) {
    let query = format!(
        "'{}' in parents and trashed=false and mimeType contains 'image/'",
        folder_id
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/drive/v3/files"),
            request::query(url_decoded(contains(("q", eq(query))))),
            request::query(url_decoded(not(contains(key("pageToken"))))),
        ])
        .respond_with(json_encoded(files_body(files, next_page_token))),
    );
}

/// Expect a follow-up page request carrying `page_token`.
pub fn expect_next_page(
    server: &Server,
    page_token: &str,
    files: Vec<serde_json::Value>,
    next_page_token: Option<&str>,
) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/drive/v3/files"),
            request::query(url_decoded(contains(("pageToken", eq(page_token.to_string()))))),
        ])
        .respond_with(json_encoded(files_body(files, next_page_token))),
    );
}

/// Expect a listing request that fails with `status`.
pub fn expect_listing_failure(server: &Server, status: u16) {
    server.expect(
        Expectation::matching(request::method_path("GET", "/drive/v3/files"))
            .times(..)
            .respond_with(status_code(status)),
    );
}
