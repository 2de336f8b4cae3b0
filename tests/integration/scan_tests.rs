use dupesieve::duplicates::{DuplicateFinder, FinderConfig};
use dupesieve::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn names(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.size_groups, 0);
    assert_eq!(summary.quickhash_groups, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(summary.stage_lines().last().unwrap(), "0 duplicate groups found");
}

#[test]
fn test_scan_four_file_scenario() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", &[b'X'; 100]);
    write(dir.path(), "b", &[b'X'; 100]);
    write(dir.path(), "c", &[b'Y'; 100]);
    write(dir.path(), "d", &[b'Z'; 50]);

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.size_groups, 1);
    assert_eq!(summary.size_candidates, 3);
    assert_eq!(summary.eliminated_by_size, 1);
    assert_eq!(summary.quickhash_groups, 1);
    assert_eq!(summary.eliminated_by_quickhash, 1);

    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0].paths()), vec!["a", "b"]);
    assert_eq!(groups[0].size, 100);
    assert_eq!(summary.reclaimable_space, 100);
}

#[test]
fn test_scan_nested_duplicates_have_absolute_paths() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one/photo.jpg", b"same bytes");
    write(dir.path(), "two/deeper/photo-copy.jpg", b"same bytes");
    write(dir.path(), "two/other.jpg", b"different!");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].paths().iter().all(|p| p.is_absolute()));
    assert_eq!(
        names(&groups[0].paths()),
        vec!["photo.jpg", "photo-copy.jpg"]
    );
}

#[test]
fn test_scan_multiple_groups_are_ordered_by_enumeration() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a1", b"first group");
    write(dir.path(), "b1", b"second grp!");
    write(dir.path(), "c1", b"first group");
    write(dir.path(), "d1", b"second grp!");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(names(&groups[0].paths()), vec!["a1", "c1"]);
    assert_eq!(names(&groups[1].paths()), vec!["b1", "d1"]);
    assert_eq!(summary.duplicate_files, 2);
}

#[test]
fn test_scan_empty_files_are_not_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_scan_respects_walker_config() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep1.dat", b"payload");
    write(dir.path(), "keep2.dat", b"payload");
    write(dir.path(), "skip.tmp", b"payload");
    write(dir.path(), ".hidden", b"payload");

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        skip_hidden: true,
        ignore_patterns: vec!["*.tmp".to_string()],
        ..Default::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(names(&groups[0].paths()), vec!["keep1.dat", "keep2.dat"]);
}

#[test]
fn test_scan_is_repeatable_across_thread_counts() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        let content = format!("content-{}", i % 7);
        write(dir.path(), &format!("f{i:02}"), content.as_bytes());
    }

    let single = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(dir.path())
        .unwrap()
        .0;
    let many = DuplicateFinder::new(FinderConfig::default().with_io_threads(16))
        .find_duplicates(dir.path())
        .unwrap()
        .0;

    assert_eq!(single.len(), 7);
    assert_eq!(single, many);
}
