//! Common test utilities for the tankobon crate.
//!
//! Provides functions for setting up unique test directories, creating
//! dummy `.cbz` fixtures, and snapshotting directory trees for
//! content-equality assertions.

use rand::{Rng, distributions::Alphanumeric};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";

/// Paths of one isolated test sandbox.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
}

/// Creates a clean, uniquely named test directory with source and dest
/// subdirectories.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    let dest_dir = test_dir.join("dest");

    fs::create_dir_all(&source_dir).await.unwrap();
    fs::create_dir_all(&dest_dir).await.unwrap();

    TestDirs {
        test_dir,
        source_dir,
        dest_dir,
    }
}

/// Writes a minimal chapter archive with a `ComicInfo.xml` (unless told
/// otherwise) and one page entry.
#[allow(dead_code)]
pub fn make_cbz(dir: &Path, name: &str, include_comicinfo: bool) -> PathBuf {
    let mut entries: Vec<(&str, &[u8])> = vec![("001.jpg", b"fakeimagecontent")];
    if include_comicinfo {
        entries.insert(0, ("ComicInfo.xml", b"<ComicInfo></ComicInfo>"));
    }
    make_cbz_with_entries(dir, name, &entries)
}

/// Writes a chapter archive with exactly the given entries.
#[allow(dead_code)]
pub fn make_cbz_with_entries(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (entry_name, contents) in entries {
        writer.start_file(entry_name.to_string(), options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
    path
}

/// Collects every path under `root` relative to it, sorted, for
/// content-equality assertions across runs and worker counts.
#[allow(dead_code)]
pub fn snapshot_tree(root: &Path) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            out.push(
                path.strip_prefix(base)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/"),
            );
            if path.is_dir() {
                walk(base, &path, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}
