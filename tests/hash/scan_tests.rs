// Tests for the scan module

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use hashr::hash::{
    digest_bytes, ErrorPolicy, ExclusionSet, HashAlgorithm, HashUtilityError, ScanEngine,
    ScanStats,
};
use tempfile::TempDir;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

/// Run a scan and return the raw output lines
fn scan_lines(engine: &ScanEngine, root: &Path) -> (Vec<String>, ScanStats) {
    let mut out = Vec::new();
    let stats = engine.scan(root, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    (text.lines().map(str::to_string).collect(), stats)
}

/// Split output lines into path -> digest
fn by_path(lines: &[String]) -> HashMap<PathBuf, String> {
    lines
        .iter()
        .map(|line| {
            let (hash, path) = line.split_once(' ').unwrap();
            (PathBuf::from(path), hash.to_string())
        })
        .collect()
}

fn engine(algorithm: HashAlgorithm, files: &[&str], dirs: &[&str]) -> ScanEngine {
    ScanEngine::new(algorithm).with_exclusions(ExclusionSet::from_patterns(files, dirs).unwrap())
}

#[test]
fn test_scan_excludes_matching_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("a.txt"), b"hello").unwrap();
    fs::write(root.join("b.log"), b"log line").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub/c.txt"), b"content of c").unwrap();

    let (lines, stats) = scan_lines(&engine(HashAlgorithm::Sha256, &["*.log"], &[]), root);
    let hashes = by_path(&lines);

    assert_eq!(lines.len(), 2);
    assert_eq!(hashes[&root.join("a.txt")], HELLO_SHA256);
    assert_eq!(
        hashes[&root.join("sub").join("c.txt")],
        digest_bytes(b"content of c", HashAlgorithm::Sha256)
    );
    assert!(!hashes.contains_key(&root.join("b.log")));

    assert_eq!(stats.files_hashed, 2);
    assert_eq!(stats.files_excluded, 1);
    assert_eq!(stats.bytes_hashed, 5 + 12);
}

#[test]
fn test_scan_excluded_directory_hides_whole_subtree() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("node_modules/pkg/deep")).unwrap();
    fs::write(root.join("node_modules/index.js"), b"x").unwrap();
    fs::write(root.join("node_modules/pkg/deep/file.txt"), b"y").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/main.rs"), b"fn main() {}").unwrap();

    let (lines, stats) = scan_lines(&engine(HashAlgorithm::Md5, &[], &["node_*"]), root);

    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("main.rs"));
    assert_eq!(stats.dirs_excluded, 1);
}

#[test]
fn test_directory_patterns_do_not_exclude_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("build"), b"a file named like a directory").unwrap();
    fs::create_dir(root.join("build.d")).unwrap();
    fs::write(root.join("build.d/inner"), b"inner").unwrap();

    let (lines, _) = scan_lines(&engine(HashAlgorithm::Md5, &[], &["build*"]), root);

    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("build"));
}

#[test]
fn test_file_patterns_match_basename_only() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("logs")).unwrap();
    fs::write(root.join("logs/today.txt"), b"today").unwrap();

    // The parent directory name is not part of what file patterns see
    let (lines, _) = scan_lines(&engine(HashAlgorithm::Md5, &["logs*", "*/today.txt"], &[]), root);
    assert_eq!(lines.len(), 1);
}

#[test]
fn test_scan_empty_directory() {
    let dir = TempDir::new().unwrap();

    let (lines, stats) = scan_lines(&ScanEngine::new(HashAlgorithm::Sha256), dir.path());

    assert!(lines.is_empty());
    assert_eq!(stats, ScanStats::default());
}

#[test]
fn test_scan_single_file_root() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("hello.txt");
    fs::write(&file, b"hello").unwrap();

    let (lines, _) = scan_lines(&ScanEngine::new(HashAlgorithm::Sha256), &file);

    assert_eq!(lines, vec![format!("{} {}", HELLO_SHA256, file.display())]);
}

#[test]
fn test_root_file_is_subject_to_exclusion() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("debug.log");
    fs::write(&file, b"noise").unwrap();

    let (lines, stats) = scan_lines(&engine(HashAlgorithm::Md5, &["*.log"], &[]), &file);

    assert!(lines.is_empty());
    assert_eq!(stats.files_excluded, 1);
}

#[test]
fn test_root_directory_is_subject_to_exclusion() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("target");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("artifact"), b"bin").unwrap();

    let (lines, stats) = scan_lines(&engine(HashAlgorithm::Md5, &[], &["target"]), &root);

    assert!(lines.is_empty());
    assert_eq!(stats.dirs_excluded, 1);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("x/y")).unwrap();
    fs::write(root.join("one"), b"1").unwrap();
    fs::write(root.join("x/two"), b"2").unwrap();
    fs::write(root.join("x/y/three"), b"3").unwrap();

    let engine = ScanEngine::new(HashAlgorithm::Sha1);
    let (first, _) = scan_lines(&engine, root);
    let (second, _) = scan_lines(&engine, root);

    assert_eq!(first.len(), 3);
    assert_eq!(by_path(&first), by_path(&second));
}

#[test]
fn test_scan_is_depth_first() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    for sub in ["left", "right"] {
        fs::create_dir_all(root.join(sub).join("nested")).unwrap();
        for i in 0..3 {
            fs::write(root.join(sub).join(format!("f{}", i)), sub).unwrap();
            fs::write(root.join(sub).join("nested").join(format!("g{}", i)), sub).unwrap();
        }
    }

    let (lines, _) = scan_lines(&ScanEngine::new(HashAlgorithm::Md5), root);
    assert_eq!(lines.len(), 12);

    // Each subtree's lines form one contiguous run
    let owners: Vec<bool> = lines
        .iter()
        .map(|l| l.contains(&format!("{}", root.join("left").display())))
        .collect();
    let switches = owners.windows(2).filter(|w| w[0] != w[1]).count();
    assert_eq!(switches, 1);
}

#[test]
fn test_scan_very_deep_tree() {
    let dir = TempDir::new().unwrap();
    let mut path = dir.path().to_path_buf();
    for _ in 0..200 {
        path.push("d");
    }
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("leaf"), b"leaf").unwrap();

    let (lines, _) = scan_lines(&ScanEngine::new(HashAlgorithm::Md5), dir.path());

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0], format!("{} {}", digest_bytes(b"leaf", HashAlgorithm::Md5), path.join("leaf").display()));
}

/// Deeper than the default 1024 open-descriptor limit
#[cfg(target_os = "linux")]
#[test]
fn test_scan_deeper_than_descriptor_limit() {
    let dir = TempDir::new().unwrap();
    let mut path = dir.path().to_path_buf();
    for _ in 0..1100 {
        path.push("d");
    }
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("leaf"), b"leaf").unwrap();

    let engine = ScanEngine::new(HashAlgorithm::Md5).with_error_policy(ErrorPolicy::Abort);
    let (lines, stats) = scan_lines(&engine, dir.path());

    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("/d/leaf"));
    assert_eq!(stats.dirs_failed, 0);
}

#[test]
fn test_walk_is_lazy_and_tracks_stats() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a"), b"a").unwrap();
    fs::write(dir.path().join("b"), b"b").unwrap();

    let engine = ScanEngine::new(HashAlgorithm::Sha512);
    let mut walk = engine.walk(dir.path());

    let first = walk.next().unwrap().unwrap();
    assert_eq!(first.algorithm, HashAlgorithm::Sha512);
    assert_eq!(walk.stats().files_hashed, 1);

    let rest: Vec<_> = walk.by_ref().collect();
    assert_eq!(rest.len(), 1);
    assert_eq!(walk.into_stats().files_hashed, 2);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_followed_and_dangling_links_skipped() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("real.txt"), b"hello").unwrap();
    symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
    symlink(root.join("missing"), root.join("dangling")).unwrap();

    let (lines, stats) = scan_lines(&ScanEngine::new(HashAlgorithm::Sha256), root);
    let hashes = by_path(&lines);

    assert_eq!(lines.len(), 2);
    assert_eq!(hashes[&root.join("link.txt")], HELLO_SHA256);
    assert_eq!(stats.entries_skipped, 1);
}

#[cfg(unix)]
#[test]
fn test_special_files_are_skipped() {
    use std::os::unix::net::UnixListener;

    let dir = TempDir::new().unwrap();
    let _listener = UnixListener::bind(dir.path().join("sock")).unwrap();
    fs::write(dir.path().join("plain"), b"plain").unwrap();

    let (lines, stats) = scan_lines(&ScanEngine::new(HashAlgorithm::Md5), dir.path());

    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("plain"));
    assert_eq!(stats.entries_skipped, 1);
}

/// Make a file or directory unreadable; returns false when permissions are
/// not enforced (root)
#[cfg(unix)]
fn make_unreadable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    if path.is_dir() {
        fs::read_dir(path).is_err()
    } else {
        fs::File::open(path).is_err()
    }
}

/// Give a locked directory its permissions back so the temp dir can be removed
#[cfg(unix)]
fn restore(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_by_default() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("locked"), b"secret").unwrap();
    fs::write(root.join("open"), b"public").unwrap();
    if !make_unreadable(&root.join("locked")) {
        return;
    }

    let (lines, stats) = scan_lines(&ScanEngine::new(HashAlgorithm::Md5), root);

    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("open"));
    assert_eq!(stats.files_failed, 1);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_aborts_in_strict_mode() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("locked");
    fs::write(&file, b"secret").unwrap();
    if !make_unreadable(&file) {
        return;
    }

    let engine = ScanEngine::new(HashAlgorithm::Md5).with_error_policy(ErrorPolicy::Abort);
    let mut out = Vec::new();
    let err = engine.scan(dir.path(), &mut out).unwrap_err();

    assert_eq!(err.path(), Some(&file));
    assert!(out.is_empty());
}

#[cfg(unix)]
#[test]
fn test_unlistable_directory_is_skipped_by_default() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let locked = root.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inner"), b"hidden").unwrap();
    fs::write(root.join("open"), b"public").unwrap();
    if !make_unreadable(&locked) {
        restore(&locked);
        return;
    }

    let (lines, stats) = scan_lines(&ScanEngine::new(HashAlgorithm::Md5), root);
    restore(&locked);

    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("open"));
    assert_eq!(stats.files_hashed, 1);
    assert_eq!(stats.dirs_failed, 1);
    assert_eq!(stats.files_failed, 0);
}

#[cfg(unix)]
#[test]
fn test_unlistable_directory_aborts_in_strict_mode() {
    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(dir.path().join("open"), b"public").unwrap();
    if !make_unreadable(&locked) {
        restore(&locked);
        return;
    }

    let engine = ScanEngine::new(HashAlgorithm::Md5).with_error_policy(ErrorPolicy::Abort);
    let mut out = Vec::new();
    let result = engine.scan(dir.path(), &mut out);
    restore(&locked);

    let err = result.unwrap_err();
    assert_eq!(err.path(), Some(&locked));
    assert!(matches!(err, HashUtilityError::PermissionDenied { .. }));
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_written_verbatim() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let latin1 = root.join(OsStr::from_bytes(b"caf\xe9"));
    fs::write(&latin1, b"hello").unwrap();
    fs::write(root.join(OsStr::from_bytes(b"\xff.bin")), b"binary").unwrap();

    let mut out = Vec::new();
    let stats = engine(HashAlgorithm::Sha256, &["*.bin"], &[])
        .scan(root, &mut out)
        .unwrap();

    let mut expected = format!("{} ", HELLO_SHA256).into_bytes();
    expected.extend_from_slice(latin1.as_os_str().as_bytes());
    expected.push(b'\n');
    assert_eq!(out, expected);
    assert_eq!(stats.files_excluded, 1);
}
