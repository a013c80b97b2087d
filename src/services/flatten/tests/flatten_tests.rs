use super::*;
use std::fs;
use tempfile::TempDir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_flatten_discards_nested_structure() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    write(&src.join("a.2da"), b"a");
    write(&src.join("textures/b.tga"), b"b");
    write(&src.join("textures/deep/c.tpc"), b"c");

    let dest = dir.path().join("Override");
    let summary = flatten(&src, &dest, FlattenOptions::default()).unwrap();

    assert_eq!(summary.copied, 3);
    assert_eq!(fs::read(dest.join("a.2da")).unwrap(), b"a");
    assert_eq!(fs::read(dest.join("b.tga")).unwrap(), b"b");
    assert_eq!(fs::read(dest.join("c.tpc")).unwrap(), b"c");
    assert!(!dest.join("textures").exists());
}

#[test]
fn test_flatten_skips_dialog_tlk_any_case() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    write(&src.join("dialog.tlk"), b"tlk");
    write(&src.join("lang/DIALOG.TLK"), b"tlk2");
    write(&src.join("keep.txt"), b"keep");

    let dest = dir.path().join("Override");
    let summary = flatten(&src, &dest, FlattenOptions::default()).unwrap();

    assert_eq!(summary.copied, 1);
    assert_eq!(summary.skipped_tlk.len(), 2);
    assert!(!dest.join("dialog.tlk").exists());
    assert!(!dest.join("DIALOG.TLK").exists());
    assert!(dest.join("keep.txt").exists());
}

#[test]
fn test_flatten_overwrites_existing_destination() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    write(&src.join("appearance.2da"), b"new");

    let dest = dir.path().join("Override");
    write(&dest.join("appearance.2da"), b"old");
    write(&dest.join("untouched.2da"), b"same");

    flatten(&src, &dest, FlattenOptions::default()).unwrap();

    assert_eq!(fs::read(dest.join("appearance.2da")).unwrap(), b"new");
    assert_eq!(fs::read(dest.join("untouched.2da")).unwrap(), b"same");
}

#[test]
fn test_flatten_collision_last_in_lexicographic_walk_wins() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    write(&src.join("A_first/x.txt"), b"first");
    write(&src.join("B_second/x.txt"), b"second");

    let dest = dir.path().join("out");
    flatten(&src, &dest, FlattenOptions::default()).unwrap();

    assert_eq!(fs::read(dest.join("x.txt")).unwrap(), b"second");
}

#[test]
fn test_flatten_missing_source_is_noop() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out");

    let summary = flatten(&dir.path().join("missing"), &dest, FlattenOptions::default()).unwrap();

    assert_eq!(summary, FlattenSummary::default());
    assert!(!dest.exists());
}

#[test]
fn test_flatten_native_order_copies_everything() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    write(&src.join("one/a.txt"), b"a");
    write(&src.join("two/b.txt"), b"b");

    let dest = dir.path().join("out");
    let options = FlattenOptions {
        order: WalkOrder::Native,
        preserve_mtime: false,
    };
    let summary = flatten(&src, &dest, options).unwrap();

    assert_eq!(summary.copied, 2);
    assert!(dest.join("a.txt").exists());
    assert!(dest.join("b.txt").exists());
}

#[test]
fn test_is_dialog_tlk() {
    assert!(is_dialog_tlk(Path::new("dialog.tlk")));
    assert!(is_dialog_tlk(Path::new("x/Dialog.TLK")));
    assert!(!is_dialog_tlk(Path::new("dialogf.tlk")));
    assert!(!is_dialog_tlk(Path::new("dialog.tlk.bak")));
}

#[test]
fn test_walk_order_serde_names() {
    assert_eq!(
        serde_json::to_string(&WalkOrder::Lexicographic).unwrap(),
        "\"lexicographic\""
    );
    let parsed: WalkOrder = serde_json::from_str("\"native\"").unwrap();
    assert_eq!(parsed, WalkOrder::Native);
}
