use assert_cmd::Command;
use httptest::{matchers::*, responders::*, Expectation};
use mocks::{drive_file, drive_server};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn build_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bandsite").unwrap();
    cmd.env("HOME", home);
    cmd.env_remove("DRIVE_API_KEY");
    cmd.env_remove("BANDSITE_DRIVE_API_KEY");
    cmd
}

#[test]
fn bandsite_help() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    build_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Band event photo galleries"));
    Ok(())
}

#[test]
fn slug_command() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    build_cmd(home.path())
        .args(["slug", "Aniversário de 1 ano!"])
        .assert()
        .success()
        .stdout("aniversario-de-1-ano\n");
    Ok(())
}

#[test]
fn events_without_key_lists_static_events() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    build_cmd(home.path())
        .arg("events")
        .assert()
        .success()
        .stdout(predicate::str::contains("aniversario-de-1-ano-forro-do-horizonte"))
        .stdout(predicate::str::contains("/images/events/cover/aniversario-1-ano.png"))
        .stdout(predicate::str::contains("images: 0"));
    Ok(())
}

#[test]
fn unknown_event_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    build_cmd(home.path())
        .args(["event", "nao-existe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Event not found"));
    Ok(())
}

#[test]
fn empty_events_file() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let file = home.path().join("events.toml");
    std::fs::write(&file, "events = []\n")?;
    build_cmd(home.path())
        .arg("--events-file")
        .arg(&file)
        .arg("events")
        .assert()
        .success()
        .stdout(predicate::str::contains("No events registered yet"));
    Ok(())
}

#[test]
fn init_config_writes_file() -> Result<(), Box<dyn std::error::Error>> {
    let home = TempDir::new()?;
    let path = home.path().join("bandsite.toml");
    build_cmd(home.path())
        .arg("--config")
        .arg(&path)
        .arg("--page-size")
        .arg("7")
        .arg("init-config")
        .assert()
        .success();
    let written = std::fs::read_to_string(&path)?;
    assert!(written.contains("page_size = 7"));
    Ok(())
}

#[test]
fn validate_and_download_against_mock_drive() -> Result<(), Box<dyn std::error::Error>> {
    let server = drive_server();
    // One listing per invocation.
    server.expect(
        Expectation::matching(request::method_path("GET", "/drive/v3/files"))
            .times(2)
            .respond_with(json_encoded(serde_json::json!({
                "files": [
                    drive_file("b", "Frame 2", "image/jpeg"),
                    drive_file("a", "Frame 1", "image/jpeg"),
                ]
            }))),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/uc"))
            .times(..)
            .respond_with(
                status_code(200)
                    .insert_header("content-type", "image/jpeg")
                    .body("jpeg"),
            ),
    );
    let base = server.url_str("");
    let base = base.trim_end_matches('/');

    let home = TempDir::new()?;
    let events = home.path().join("events.toml");
    std::fs::write(
        &events,
        r#"
[[events]]
id = "9"
title = "Show Teste"
date = "17 de Maio, 2025"
drive_folder_link = "https://drive.google.com/drive/folders/folderX"
"#,
    )?;

    build_cmd(home.path())
        .env("DRIVE_API_KEY", "key")
        .env("BANDSITE_DRIVE_API_BASE", base)
        .env("BANDSITE_DRIVE_WEB_BASE", base)
        .arg("--events-file")
        .arg(&events)
        .args(["validate", "show-teste"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validated 2 images, showing 2"))
        .stdout(predicate::str::contains(format!("{}/uc?export=view&id=a", base)));

    let out = home.path().join("photo.jpg");
    build_cmd(home.path())
        .env("DRIVE_API_KEY", "key")
        .env("BANDSITE_DRIVE_API_BASE", base)
        .env("BANDSITE_DRIVE_WEB_BASE", base)
        .arg("--events-file")
        .arg(&events)
        .args(["download", "show-teste", "0", "--no-browser", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved to"));
    assert_eq!(std::fs::read(&out)?, b"jpeg");
    Ok(())
}
