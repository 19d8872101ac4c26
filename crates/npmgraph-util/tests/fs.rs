use npmgraph_util::fs::{dir_size, ensure_dir, find_ancestor_with, format_size, write_atomic};
use tempfile::TempDir;

#[test]
fn test_find_ancestor_with_direct() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("npmgraph.toml"), "").unwrap();
    let result = find_ancestor_with(tmp.path(), "npmgraph.toml");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_nested() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("npmgraph.toml"), "").unwrap();
    let nested = tmp.path().join("a").join("b").join("c");
    std::fs::create_dir_all(&nested).unwrap();
    let result = find_ancestor_with(&nested, "npmgraph.toml");
    assert_eq!(result, Some(tmp.path().to_path_buf()));
}

#[test]
fn test_find_ancestor_with_not_found() {
    let tmp = TempDir::new().unwrap();
    let result = find_ancestor_with(tmp.path(), "NonExistent.file");
    assert_eq!(result, None);
}

#[test]
fn test_ensure_dir_creates_nested() {
    let tmp = TempDir::new().unwrap();
    let deep = tmp.path().join("x").join("y").join("z");
    assert!(!deep.exists());
    ensure_dir(&deep).unwrap();
    assert!(deep.is_dir());
}

#[test]
fn test_ensure_dir_idempotent() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("already");
    std::fs::create_dir(&dir).unwrap();
    ensure_dir(&dir).unwrap();
    assert!(dir.is_dir());
}

#[test]
fn test_write_atomic_creates_parents() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("registry").join("@scope").join("pkg.json");
    write_atomic(&path, b"{}").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"{}");
    let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("pkg.json")]);
}

#[test]
fn test_write_atomic_concurrent_writers_same_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("registry").join("express.json");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let path = path.clone();
            std::thread::spawn(move || write_atomic(&path, format!("{{\"n\":{i}}}").as_bytes()))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("{\"n\":") && contents.ends_with('}'), "got: {contents}");
    assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
}

#[test]
fn test_dir_size_counts_nested_files() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("a")).unwrap();
    std::fs::write(tmp.path().join("one"), [0u8; 10]).unwrap();
    std::fs::write(tmp.path().join("a").join("two"), [0u8; 5]).unwrap();
    assert_eq!(dir_size(tmp.path()), 15);
    assert_eq!(dir_size(&tmp.path().join("missing")), 0);
}

#[test]
fn test_format_size_units() {
    assert_eq!(format_size(512), "512 B");
    assert_eq!(format_size(2048), "2.0 KB");
    assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
}
