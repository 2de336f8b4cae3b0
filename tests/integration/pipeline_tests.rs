use dupesieve::duplicates::{
    group_by_size, phase2_quickhash, phase3_fullhash, DuplicateFinder, FinderConfig, FinderError,
};
use dupesieve::scanner::{FileRecord, Hasher, Walker, WalkerConfig};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn enumerate(root: &Path) -> Vec<FileRecord> {
    Walker::new(root, WalkerConfig::default())
        .walk()
        .map(Result::unwrap)
        .collect()
}

fn file_names(records: &[FileRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.path().file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_file_deleted_after_enumeration_is_excluded() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(name), b"identical").unwrap();
    }
    let files = enumerate(dir.path());
    fs::remove_file(dir.path().join("b")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(file_names(&groups[0].files), vec!["a", "c"]);
    assert_eq!(summary.unavailable_files, 1);
    assert!(!summary.has_errors());
}

#[test]
fn test_pair_reduced_to_one_member_disappears() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"identical").unwrap();
    fs::write(dir.path().join("b"), b"identical").unwrap();
    let files = enumerate(dir.path());
    fs::remove_file(dir.path().join("a")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.quickhash_groups, 0);
}

#[test]
fn test_single_byte_mutation_in_window_splits_at_fingerprint() {
    let dir = tempdir().unwrap();
    let original = vec![7u8; 4096];
    let mut mutated = original.clone();
    mutated[2048] ^= 0xff;
    fs::write(dir.path().join("a"), &original).unwrap();
    fs::write(dir.path().join("b"), &mutated).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.size_groups, 1);
    assert_eq!(summary.quickhash_groups, 0);
    assert!(groups.is_empty());
}

#[test]
fn test_single_byte_mutation_outside_window_splits_at_digest() {
    let dir = tempdir().unwrap();
    let original = vec![7u8; 1 << 20];
    let mut mutated = original.clone();
    *mutated.last_mut().unwrap() ^= 0x01;
    fs::write(dir.path().join("a"), &original).unwrap();
    fs::write(dir.path().join("b"), &original).unwrap();
    fs::write(dir.path().join("c"), &mutated).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.quickhash_groups, 1);
    assert_eq!(summary.quickhash_candidates, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(file_names(&groups[0].files), vec!["a", "b"]);
}

#[test]
fn test_stages_only_narrow() {
    let dir = tempdir().unwrap();
    for i in 0..30u8 {
        let len = 64 + usize::from(i % 3) * 2048;
        let fill = i % 4;
        fs::write(dir.path().join(format!("f{i:02}")), vec![fill; len]).unwrap();
    }

    let files = enumerate(dir.path());
    let total = files.len();
    let (size_groups, _) = group_by_size(files);
    let size_members: usize = size_groups.iter().map(|g| g.len()).sum();

    let hasher = Arc::new(Hasher::new());
    let config = FinderConfig::default();
    let (fp_groups, _) = phase2_quickhash(size_groups.clone(), &hasher, &config).unwrap();
    let fp_members: usize = fp_groups.iter().map(|g| g.len()).sum();

    // Every fingerprint group lies inside one size group.
    for group in &fp_groups {
        assert!(size_groups.iter().any(|sg| group
            .files()
            .iter()
            .all(|f| sg.files().iter().any(|m| m.path() == f.path()))));
    }

    let (dup_groups, _) = phase3_fullhash(fp_groups, &hasher, &config).unwrap();
    let dup_members: usize = dup_groups.iter().map(|g| g.len()).sum();

    assert!(total >= size_members);
    assert!(size_members >= fp_members);
    assert!(fp_members >= dup_members);
    assert!(dup_groups.iter().all(|g| g.len() >= 2));
}

#[test]
fn test_interrupted_scan_reports_interruption() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"x").unwrap();

    let config = FinderConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true)));
    let result = DuplicateFinder::new(config).find_duplicates(dir.path());

    assert!(matches!(result, Err(FinderError::Interrupted)));
}

#[test]
fn test_generous_timeout_changes_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let config = FinderConfig::default().with_hash_timeout(Some(Duration::from_secs(60)));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.unavailable_files, 0);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_in_full_hash_is_skipped_unless_strict() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(name), b"identical").unwrap();
    }
    let hasher = Arc::new(Hasher::new());
    let (size_groups, _) = group_by_size(enumerate(dir.path()));
    let (fp_groups, _) =
        phase2_quickhash(size_groups, &hasher, &FinderConfig::default()).unwrap();

    let locked = dir.path().join("c");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::File::open(&locked).is_ok() {
        // Running as root; permissions are not enforced.
        return;
    }

    let (groups, stats) =
        phase3_fullhash(fp_groups.clone(), &hasher, &FinderConfig::default()).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(stats.failed_files, 1);

    let strict = FinderConfig::default().with_strict(true);
    let err = phase3_fullhash(fp_groups, &hasher, &strict).unwrap_err();
    assert!(matches!(err, FinderError::Hash { .. }));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
