use repopick::logging::{filter_directive, rotate_log, LogRotation, DEFAULT_FILTER};

fn numbered_lines(n: usize) -> String {
    (1..=n).map(|i| format!("line {}\n", i)).collect()
}

#[test]
fn rotate_log_keeps_the_newest_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("repopick.log");
    std::fs::write(&path, numbered_lines(1001)).unwrap();

    let dropped = rotate_log(&path, LogRotation::default());
    assert_eq!(dropped, 251);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 750);
    assert_eq!(lines[0], "line 252");
    assert_eq!(lines[749], "line 1001");
}

#[test]
fn rotate_log_leaves_small_or_missing_files_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("repopick.log");
    assert_eq!(rotate_log(&path, LogRotation::default()), 0);
    assert!(!path.exists());

    std::fs::write(&path, numbered_lines(1000)).unwrap();
    assert_eq!(rotate_log(&path, LogRotation::default()), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), numbered_lines(1000));
}

#[test]
fn rotate_log_with_custom_bounds() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("repopick.log");
    std::fs::write(&path, numbered_lines(5)).unwrap();

    let rotation = LogRotation {
        max_lines: 3,
        keep_lines: 2,
    };
    assert_eq!(rotate_log(&path, rotation), 3);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "line 4\nline 5\n");
}

#[test]
fn filter_directive_prefers_repopick_log() {
    assert_eq!(
        filter_directive(Some("repopick=trace".into()), Some("info".into())),
        "repopick=trace"
    );
    assert_eq!(filter_directive(Some("  ".into()), Some("info".into())), "info");
    assert_eq!(filter_directive(None, None), DEFAULT_FILTER);
}
