//! Integration tests for websnap
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored

mod common;

use std::time::Duration;

use websnap::{visit, Error, Output, VisitOptions};

fn fast_options() -> VisitOptions {
    VisitOptions {
        quiet: Duration::from_millis(500),
        timeout: Duration::from_millis(10_000),
        ..VisitOptions::default()
    }
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn visit_writes_all_archive_artifacts() {
    let base = common::start();
    let root = tempfile::tempdir().expect("tempdir");
    let dir = root.path().join("snap");

    let summary = visit(&base, &Output::Archive(dir.clone()), &fast_options())
        .await
        .expect("visit failed");

    assert!(dir.join("cookies.json").exists());
    assert!(dir.join("resources.json").exists());
    assert!(dir.join("capture.png").exists());

    let data = std::fs::read(dir.join("resources.json")).unwrap();
    let resources: serde_json::Value = serde_json::from_slice(&data).unwrap();
    let records = resources.as_array().expect("array");

    // The document plus the stylesheet and the script, in arrival order.
    assert!(
        records.len() >= 3,
        "expected at least 3 records, got {}",
        records.len()
    );
    assert_eq!(records[0]["url"].as_str().unwrap(), base);
    assert_eq!(records[0]["status"], 200);
    assert_eq!(summary.resources, records.len());

    let urls: Vec<&str> = records.iter().filter_map(|r| r["url"].as_str()).collect();
    assert!(urls.iter().any(|u| u.ends_with("/style.css")), "urls: {:?}", urls);
    assert!(urls.iter().any(|u| u.ends_with("/app.js")), "urls: {:?}", urls);
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn cookie_jar_captures_the_set_cookie() {
    let base = common::start();
    let root = tempfile::tempdir().expect("tempdir");
    let jar = root.path().join("cookies.json");

    let summary = visit(&base, &Output::CookieJar(jar.clone()), &fast_options())
        .await
        .expect("visit failed");

    let data = std::fs::read(&jar).unwrap();
    let cookies: serde_json::Value = serde_json::from_slice(&data).unwrap();
    let names: Vec<&str> = cookies
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"visited"), "cookies: {:?}", names);
    assert_eq!(summary.cookies, names.len());

    // Cookie-jar visits never produce the archive artifacts.
    assert!(!root.path().join("resources.json").exists());
    assert!(!root.path().join("capture.png").exists());
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn unreachable_page_is_a_load_failure_with_no_output() {
    let root = tempfile::tempdir().expect("tempdir");
    let jar = root.path().join("cookies.json");

    // Nothing listens on the discard port.
    let result = visit(
        "http://127.0.0.1:9/",
        &Output::CookieJar(jar.clone()),
        &fast_options(),
    )
    .await;

    match result {
        Err(Error::PageLoad(_)) | Err(Error::Timeout(_)) => {}
        other => panic!("expected a load failure, got {:?}", other.map(|s| s.resources)),
    }
    assert!(!jar.exists());
}
