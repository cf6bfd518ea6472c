//! Integration tests for the Alexandria library manager.
//!
//! These tests use an async-aware MPSC channel from `tokio::sync` as the event
//! sink, the same way a front end's event loop would drain worker events.

use alexandria_library::app::{self, events::UserEvent, state::AppState};
use alexandria_library::config::AppConfig;
use alexandria_library::core::sidecar::{bib_path, load_flags};
use alexandria_library::utils::test_helpers::write_sample_pdf;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use std::fs;

    /// `TestHarness` sets up a complete, isolated environment for each test case.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub proxy: mpsc::UnboundedSender<UserEvent>,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub root_path: PathBuf,
        _temp_dir: TempDir,
        _config_dir: TempDir,
    }

    impl TestHarness {
        /// Creates a new test harness with a clean configuration.
        pub fn new() -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let config_dir = tempfile::tempdir().expect("Failed to create config dir");
            let root_path = temp_dir.path().to_path_buf();
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            let mut state = AppState::new(AppConfig {
                base_path: root_path.clone(),
                ..Default::default()
            });
            state.config_path = Some(config_dir.path().join("config.json"));

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: event_tx,
                event_rx,
                root_path,
                _temp_dir: temp_dir,
                _config_dir: config_dir,
            }
        }

        /// Creates a file inside the temporary library.
        pub fn create_file(&self, path: &str, content: &str) {
            let file_path = self.root_path.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(file_path, content).expect("Failed to write file");
        }

        /// Sets up a small library with sidecars.
        pub fn setup_basic_library(&self) {
            write_sample_pdf(&self.root_path.join("a.pdf"), &[Some("Quantum Computing")])
                .expect("Failed to write PDF");
            self.create_file("a.pdf.bib", "@article{a, title={Quantum Computing}}");
            self.create_file("b.txt", "notes");
            self.create_file("physics/feynman.djvu", "AT&T");
            self.create_file("physics/feynman.djvu.json", r#"{"ocr": false}"#);
        }

        /// Pumps events into the state until `generation` finishes; returns
        /// every event seen on the way, in order.
        pub async fn wait_for_scan(&mut self, generation: u64) -> Vec<UserEvent> {
            let mut seen = Vec::new();
            loop {
                match tokio::time::timeout(Duration::from_secs(10), self.event_rx.recv()).await {
                    Ok(Some(event)) => {
                        let done = matches!(
                            &event,
                            UserEvent::ScanFinished { generation: g, .. } if *g == generation
                        );
                        seen.push(event.clone());
                        app::handle_user_event(&self.state, event);
                        if done {
                            return seen;
                        }
                    }
                    _ => panic!("Scan did not complete within timeout or channel closed"),
                }
            }
        }

        pub fn row_names(&self) -> HashSet<String> {
            let state = self.state.lock().unwrap();
            state.rows.iter().map(|r| r.file_name.clone()).collect()
        }
    }
}

fn set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_select_directory_lists_all_library_files() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();

    let generation = app::commands::select_directory(
        harness.root_path.clone(),
        harness.proxy.clone(),
        &harness.state,
    )
    .expect("root is a directory");
    let events = harness.wait_for_scan(generation).await;

    assert_eq!(harness.row_names(), set(&["a.pdf", "b.txt", "feynman.djvu"]));

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            UserEvent::ScanProgress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));

    let state = harness.state.lock().unwrap();
    assert!(!state.is_scanning);
    assert_eq!(state.selected_dir.as_deref(), Some(harness.root_path.as_path()));
    assert_eq!(state.config.last_directory.as_deref(), Some(harness.root_path.as_path()));

    let a = state.rows.iter().find(|r| r.file_name == "a.pdf").unwrap();
    assert!(a.has_bib);
    let djvu = state.rows.iter().find(|r| r.file_name == "feynman.djvu").unwrap();
    assert_eq!(djvu.directory, "physics");
    assert_eq!(djvu.ocr, Some(false));
}

#[tokio::test]
async fn test_search_by_bib_content_and_file_name() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();

    let generation =
        app::commands::start_search("quantum", harness.proxy.clone(), &harness.state).unwrap();
    harness.wait_for_scan(generation).await;
    assert_eq!(harness.row_names(), set(&["a.pdf"]));

    let generation =
        app::commands::start_search("  B ", harness.proxy.clone(), &harness.state).unwrap();
    harness.wait_for_scan(generation).await;
    assert_eq!(harness.row_names(), set(&["b.txt"]));
    assert_eq!(harness.state.lock().unwrap().search_query, "B");

    let generation = app::commands::clear_search(harness.proxy.clone(), &harness.state);
    harness.wait_for_scan(generation).await;
    assert_eq!(harness.row_names().len(), 3);
    assert!(harness.state.lock().unwrap().search_query.is_empty());
}

#[tokio::test]
async fn test_blank_search_is_ignored() {
    let harness = helpers::TestHarness::new();
    assert!(app::commands::start_search("   ", harness.proxy.clone(), &harness.state).is_none());
    assert!(!harness.state.lock().unwrap().is_scanning);
}

#[tokio::test]
async fn test_search_is_scoped_to_selected_directory() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();
    harness.create_file("physics/quantum-mechanics.pdf", "");

    let generation = app::commands::select_directory(
        harness.root_path.join("physics"),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap();
    harness.wait_for_scan(generation).await;

    let generation =
        app::commands::start_search("quantum", harness.proxy.clone(), &harness.state).unwrap();
    harness.wait_for_scan(generation).await;
    assert_eq!(harness.row_names(), set(&["quantum-mechanics.pdf"]));
}

#[tokio::test]
async fn test_new_scan_supersedes_running_one() {
    let mut harness = helpers::TestHarness::new();
    for i in 0..200 {
        harness.create_file(&format!("shelf/doc{i:03}.pdf"), "");
    }
    harness.create_file("other/only.pdf", "");

    let first = app::commands::select_directory(
        harness.root_path.join("shelf"),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap();
    let second = app::commands::select_directory(
        harness.root_path.join("other"),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap();
    assert!(second > first);

    let events = harness.wait_for_scan(second).await;
    assert_eq!(harness.row_names(), set(&["only.pdf"]));

    // Whatever the first worker managed to send before noticing the cancel
    // was not allowed to touch the state.
    let finished: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            UserEvent::ScanFinished { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect();
    assert_eq!(finished.last(), Some(&second));
    assert_eq!(harness.state.lock().unwrap().generation, second);
}

#[tokio::test]
async fn test_cancel_delivers_partial_result() {
    let mut harness = helpers::TestHarness::new();
    for i in 0..50 {
        harness.create_file(&format!("doc{i:02}.pdf"), "");
    }

    let generation = app::commands::select_directory(
        harness.root_path.clone(),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap();
    app::commands::cancel_scan(&harness.state);
    app::commands::cancel_scan(&harness.state);

    let events = harness.wait_for_scan(generation).await;
    let finished = events
        .iter()
        .filter(|e| matches!(e, UserEvent::ScanFinished { .. }))
        .count();
    assert_eq!(finished, 1, "exactly one terminal event per run");

    let state = harness.state.lock().unwrap();
    assert!(!state.is_scanning);
    // The worker may have finished before it saw the flag.
    if state.last_scan_cancelled {
        assert!(state.rows.len() <= 50);
    } else {
        assert_eq!(state.rows.len(), 50);
    }
}

#[tokio::test]
async fn test_add_file_copies_and_refreshes() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();
    let outside = tempfile::tempdir().unwrap();
    let source = outside.path().join("new-paper.pdf");
    std::fs::write(&source, "%PDF-1.7").unwrap();

    let added = app::commands::add_file(
        &source,
        Some(harness.root_path.join("physics")),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap();
    assert_eq!(added, harness.root_path.join("physics/new-paper.pdf"));

    let generation = harness.state.lock().unwrap().generation;
    let events = harness.wait_for_scan(generation).await;
    assert!(matches!(events.first(), Some(UserEvent::LibraryChanged(p)) if *p == added));
    assert!(harness.row_names().contains("new-paper.pdf"));

    let err = app::commands::add_file(
        &source,
        Some(harness.root_path.join("physics")),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("already exists"));
}

#[tokio::test]
async fn test_save_bib_makes_file_searchable() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();
    let doc = harness.root_path.join("b.txt");

    let saved = app::commands::save_bib(
        &doc,
        "@misc{b, note={Topology}}",
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap();
    assert!(saved);
    assert!(bib_path(&doc).exists());
    let generation = harness.state.lock().unwrap().generation;
    harness.wait_for_scan(generation).await;

    let generation =
        app::commands::start_search("topology", harness.proxy.clone(), &harness.state).unwrap();
    harness.wait_for_scan(generation).await;
    assert_eq!(harness.row_names(), set(&["b.txt"]));
}

#[tokio::test]
async fn test_check_ocr_updates_row() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();
    let doc = harness.root_path.join("a.pdf");

    assert!(app::commands::check_ocr(&doc, harness.proxy.clone(), &harness.state).unwrap());
    assert_eq!(load_flags(&doc).unwrap().ocr, Some(true));

    let generation = harness.state.lock().unwrap().generation;
    harness.wait_for_scan(generation).await;
    let state = harness.state.lock().unwrap();
    let row = state.rows.iter().find(|r| r.file_name == "a.pdf").unwrap();
    assert_eq!(row.ocr, Some(true));
    drop(state);

    let err = app::commands::check_ocr(
        &harness.root_path.join("b.txt"),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Not a PDF"));

    let scan = harness.root_path.join("scan.pdf");
    write_sample_pdf(&scan, &[None]).unwrap();
    assert!(!app::commands::check_ocr(&scan, harness.proxy.clone(), &harness.state).unwrap());
    assert_eq!(load_flags(&scan).unwrap().ocr, Some(false));
}

#[tokio::test]
async fn test_ipc_dispatch() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();

    let message = serde_json::json!({
        "command": "search",
        "payload": { "term": "feynman" }
    })
    .to_string();
    app::handle_ipc_message(message, harness.proxy.clone(), &harness.state);
    let generation = harness.state.lock().unwrap().generation;
    harness.wait_for_scan(generation).await;
    assert_eq!(harness.row_names(), set(&["feynman.djvu"]));

    app::handle_ipc_message(
        r#"{"command": "frobnicate"}"#.to_string(),
        harness.proxy.clone(),
        &harness.state,
    );
    app::handle_ipc_message("not json".to_string(), harness.proxy.clone(), &harness.state);
    let mut errors = 0;
    while let Ok(event) = harness.event_rx.try_recv() {
        if matches!(event, UserEvent::ShowError(_)) {
            errors += 1;
        }
    }
    assert_eq!(errors, 2);
}

#[tokio::test]
async fn test_select_invalid_directory_reports_error() {
    let mut harness = helpers::TestHarness::new();
    let missing = harness.root_path.join("nope");
    let generation =
        app::commands::select_directory(missing, harness.proxy.clone(), &harness.state);
    assert!(generation.is_none());
    assert!(matches!(harness.event_rx.try_recv(), Ok(UserEvent::ShowError(_))));
}

#[tokio::test]
async fn test_select_base_path_resets_state() {
    let mut harness = helpers::TestHarness::new();
    harness.setup_basic_library();
    let generation = app::commands::select_directory(
        harness.root_path.clone(),
        harness.proxy.clone(),
        &harness.state,
    )
    .unwrap();
    harness.wait_for_scan(generation).await;

    let physics = harness.root_path.join("physics");
    app::commands::select_base_path(physics.clone(), &harness.state).unwrap();
    let state = harness.state.lock().unwrap();
    assert_eq!(state.config.base_path, physics);
    assert!(state.rows.is_empty());
    assert!(state.selected_dir.is_none());
    assert_eq!(state.scan_root(), physics);
}
