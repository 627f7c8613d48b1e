use aql_fs::{Error, StageOptions, StagedFile, read_range};
use tempfile::tempdir;

#[test]
fn test_read_range_after_commit() {
    let dir = tempdir().unwrap();
    let mut staged = StagedFile::create(dir.path(), "container", StageOptions::new()).unwrap();
    staged.append(b"header").unwrap();
    let offset = staged.append(b"payload").unwrap();
    let path = staged.commit().unwrap();

    assert_eq!(read_range(&path, offset, 7).unwrap(), b"payload");
    assert_eq!(read_range(&path, 0, 6).unwrap(), b"header");
}

#[test]
fn test_read_range_missing_file() {
    let dir = tempdir().unwrap();
    let err = read_range(dir.path().join("nope"), 0, 1).unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn test_read_range_past_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short");
    std::fs::write(&path, b"abc").unwrap();

    let err = read_range(&path, 2, 5).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { size: 3, .. }));

    let err = read_range(&path, u64::MAX, 2).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { .. }));
}

#[test]
fn test_finished_file_is_readable_before_commit() {
    let dir = tempdir().unwrap();
    let mut staged = StagedFile::create(dir.path(), "remote", StageOptions::new().sync(false)).unwrap();
    staged.append(b"0123456789").unwrap();
    staged.finish().unwrap();

    assert_eq!(std::fs::read(staged.staging_path()).unwrap(), b"0123456789");
    assert!(staged.append(b"more").is_err());
    assert_eq!(staged.len(), 10);
}

#[test]
fn test_custom_prefix_and_suffix() {
    let dir = tempdir().unwrap();
    let options = StageOptions::new().prefix("_").suffix(".part");
    let staged = StagedFile::create(dir.path(), "x", options).unwrap();

    assert_eq!(staged.staging_path(), dir.path().join("_x.part"));
    assert_eq!(staged.final_path(), dir.path().join("x"));
}
