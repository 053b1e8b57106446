//! Whole-session tests for the playground
//!
//! These open a playground over real file storage, edit and drag, close it,
//! and check what the next session sees.

use playground::{
    Divider, Extent, FileStorage, Language, MemoryStorage, MemorySurface, Playground,
    PlaygroundConfig, PointerCapture, PointerPosition, SandboxedFile, Storage,
};
use std::path::Path;
use std::time::{Duration, Instant};

fn open_file(dir: &Path, now: Instant) -> Playground<FileStorage> {
    Playground::open(
        FileStorage::open(dir).unwrap(),
        &PlaygroundConfig::default(),
        PointerCapture::new(),
        now,
    )
}

#[test]
fn test_buffers_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let start = Instant::now();
    let tricky = [
        (Language::Html, "<script>alert('</script>')</script>"),
        (Language::Css, ""),
        (Language::Javascript, "const s = \"\\u2603 ☃\";\n\tdocument.body.append(s);"),
    ];

    {
        let mut playground = open_file(dir.path(), start);
        playground.edit(Language::Css, Some("temp".to_string()), start);
        for (language, content) in tricky {
            playground.edit(language, Some(content.to_string()), start);
        }
        playground.shutdown().unwrap();
    }

    let playground = open_file(dir.path(), start);
    for (language, content) in tricky {
        assert_eq!(playground.buffer(language), content, "{:?}", language);
    }
}

#[test]
fn test_layout_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let start = Instant::now();
    let container = Extent {
        width: 120.0,
        height: 40.0,
    };

    {
        let mut playground = open_file(dir.path(), start);
        playground.begin_drag(Divider::Horizontal(0));
        playground.update_drag(PointerPosition { x: 30.0, y: 0.0 }, container, start);
        playground.end_drag();
        playground.begin_drag(Divider::Vertical);
        playground.update_drag(PointerPosition { x: 0.0, y: 30.0 }, container, start);
        playground.end_drag();

        let mut surface = MemorySurface::new();
        let outcome = playground.tick(start + Duration::from_millis(500), &mut surface);
        assert!(outcome.flushed);
    }

    let playground = open_file(dir.path(), start);
    assert_eq!(playground.layout().horizontal, [25.0, 66.0]);
    assert_eq!(playground.layout().vertical, 75.0);
}

#[test]
fn test_storage_entries_use_namespaced_json() {
    let start = Instant::now();
    let mut playground = Playground::open(
        MemoryStorage::new(),
        &PlaygroundConfig::default(),
        PointerCapture::new(),
        start,
    );
    playground.edit(Language::Html, Some("<p>\"hi\"</p>".to_string()), start);
    playground.nudge(Divider::Vertical, 5.0, start);
    playground.flush().unwrap();

    let storage = playground.store().storage();
    assert_eq!(
        storage.get_item("codepencilhtml").as_deref(),
        Some(r#""<p>\"hi\"</p>""#)
    );
    assert_eq!(storage.get_item("codepencilverticalDivider").as_deref(), Some("55.0"));
    assert_eq!(
        storage.get_item("codepencilhorizontalDividers").as_deref(),
        Some("[33.0,66.0]")
    );
    assert!(storage.get_item("codepencilcss").is_none());
}

#[test]
fn test_typing_renders_to_sandboxed_page_once() {
    let dir = tempfile::tempdir().unwrap();
    let start = Instant::now();
    let mut playground = open_file(dir.path(), start);
    let mut surface = SandboxedFile::in_dir(dir.path());

    let mut now = start;
    for end in 1..="<h1>Hi</h1>".len() {
        now += Duration::from_millis(30);
        playground.edit(Language::Html, Some("<h1>Hi</h1>"[..end].to_string()), now);
        assert!(!playground.tick(now, &mut surface).rendered);
    }
    assert!(!surface.path().exists());

    let outcome = playground.tick(now + Duration::from_millis(250), &mut surface);
    assert!(outcome.rendered);

    let page = std::fs::read_to_string(surface.path()).unwrap();
    assert!(page.contains(r#"sandbox="allow-scripts""#));
    assert!(page.contains("&lt;body&gt;&lt;h1&gt;Hi&lt;/h1&gt;&lt;/body&gt;"));
    assert!(playground.document().contains("<body><h1>Hi</h1></body>"));
}

#[test]
fn test_custom_prefix_and_delays() {
    let start = Instant::now();
    let config = PlaygroundConfig {
        storage_prefix: "scratch".to_string(),
        persist_debounce_ms: 50,
        preview_debounce_ms: 10,
        ..PlaygroundConfig::default()
    };
    let mut playground =
        Playground::open(MemoryStorage::new(), &config, PointerCapture::new(), start);
    let mut surface = MemorySurface::new();

    playground.edit(Language::Javascript, Some("1".to_string()), start);
    assert_eq!(
        playground.next_deadline(),
        Some(start + Duration::from_millis(10))
    );
    let outcome = playground.tick(start + Duration::from_millis(50), &mut surface);
    assert!(outcome.flushed && outcome.rendered);
    assert_eq!(
        playground.store().storage().get_item("scratchjs").as_deref(),
        Some("\"1\"")
    );
}

#[test]
fn test_capture_released_after_drag_and_shutdown() {
    let start = Instant::now();
    let capture = PointerCapture::new();
    let mut playground = Playground::open(
        MemoryStorage::new(),
        &PlaygroundConfig::default(),
        capture.clone(),
        start,
    );

    playground.begin_drag(Divider::Horizontal(1));
    assert!(capture.is_captured());
    playground.shutdown().unwrap();
    assert!(!capture.is_captured());

    playground.begin_drag(Divider::Vertical);
    drop(playground);
    assert!(!capture.is_captured());
}
