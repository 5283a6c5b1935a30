// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_key_value_lines_and_skips_comments_and_blanks() {
    let props = Properties::parse(
        "# comment\n\napp.md5 = deadbeef\napp.version=1.2.3\n",
    );
    assert_eq!(props.get("app.md5"), Some("deadbeef"));
    assert_eq!(props.get("app.version"), Some("1.2.3"));
    assert_eq!(props.md5(), Some("deadbeef"));
}

#[test]
fn missing_file_yields_empty_properties_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let props = read_properties(dir.path(), "nonexistent-app").unwrap();
    assert_eq!(props.md5(), None);
}

#[test]
fn reads_a_real_properties_file() {
    let dir = tempfile::tempdir().unwrap();
    let app_dir = dir.path().join("hello");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("info.properties"), "app.md5=cafef00d\n").unwrap();
    let props = read_properties(dir.path(), "hello").unwrap();
    assert_eq!(props.md5(), Some("cafef00d"));
}
