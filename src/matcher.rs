//! Chapter archive discovery and reconciliation.
//!
//! This module scans a source directory for chapter archives, applies the
//! active [`NamingPattern`] to every filename, and reconciles the matches
//! against the resolved target range. Reconciliation failures aggregate
//! every offending chapter before reporting: a missing-chapter error lists
//! all absent numbers, a duplicate-main error lists every filename involved.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;
use tokio::fs::read_dir;

use crate::error::{Error, Result};
use crate::path_utils::{has_extension, is_hidden_file};
use crate::pattern::NamingPattern;
use crate::types::{ChapterIdentity, ChapterNumber, ChapterRange};

/// The classified matches of one matching run.
#[derive(Debug, Clone, Default)]
pub struct ChapterMatches {
    /// At most one main identity per base chapter number.
    pub mains: BTreeMap<u32, ChapterIdentity>,
    /// Extras grouped under their integer base, ascending by fractional
    /// suffix (ties broken by filename).
    pub extras: BTreeMap<u32, Vec<ChapterIdentity>>,
}

impl ChapterMatches {
    /// Looks up the extra identity with exactly this number, if matched.
    pub fn extra(&self, number: ChapterNumber) -> Option<&ChapterIdentity> {
        self.extras
            .get(&number.base)?
            .iter()
            .find(|identity| identity.number == number)
    }
}

/// Lists candidate `.cbz` archives directly inside `directory`.
///
/// Hidden files and subdirectories are skipped; the extension check is
/// case-insensitive. Results are sorted by filename for deterministic
/// downstream processing.
pub async fn find_archives(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = Vec::new();

    let mut paths = read_dir(directory).await.map_err(Error::Io)?;
    while let Some(entry) = paths.next_entry().await.map_err(Error::Io)? {
        let path = entry.path();
        if is_hidden_file(&path) {
            continue;
        }
        if path.is_dir() || !has_extension(&path, "cbz") {
            continue;
        }
        entries.push(path);
    }

    entries.par_sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("found {} archive(s) in {:?}", entries.len(), directory);
    Ok(entries)
}

/// Applies `pattern` to every filename and reconciles against `target_range`.
///
/// Policy, in order:
/// - filenames matching neither rule are ignored (not archives of interest);
/// - every integer range entry must have a main match and every decimal
///   entry an exactly-matching extra, else [`Error::MissingChapter`] listing
///   all absent numbers;
/// - a base chapter named by the range may have at most one main match,
///   else [`Error::DuplicateChapter`] naming every involved filename;
/// - matches outside the range are kept out of the result entirely, so the
///   archives stay untouched.
pub fn match_chapters(
    filenames: &[PathBuf],
    pattern: &NamingPattern,
    target_range: &ChapterRange,
) -> Result<ChapterMatches> {
    let mut mains: BTreeMap<u32, Vec<ChapterIdentity>> = BTreeMap::new();
    let mut extras: BTreeMap<u32, Vec<ChapterIdentity>> = BTreeMap::new();

    for path in filenames {
        let Some(identity) = pattern.classify(path) else {
            debug!("no match for {:?}, ignoring", path);
            continue;
        };
        let bucket = match identity.number.extra {
            Some(_) => extras.entry(identity.number.base).or_default(),
            None => mains.entry(identity.number.base).or_default(),
        };
        bucket.push(identity);
    }

    // Missing chapters are reported before duplicates, mirroring the
    // request order a caller reasons about.
    let missing: Vec<ChapterNumber> = target_range
        .iter()
        .filter(|number| match number.extra {
            None => !mains.contains_key(&number.base),
            Some(_) => !extras
                .get(&number.base)
                .map(|group| group.iter().any(|i| i.number == **number))
                .unwrap_or(false),
        })
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingChapter(missing));
    }

    let duplicates: Vec<(u32, Vec<PathBuf>)> = mains
        .iter()
        .filter(|(base, group)| target_range.contains_base(**base) && group.len() > 1)
        .map(|(base, group)| {
            (
                *base,
                group.iter().map(|i| i.source_path.clone()).collect(),
            )
        })
        .collect();
    if !duplicates.is_empty() {
        return Err(Error::DuplicateChapter(duplicates));
    }

    let mut matches = ChapterMatches::default();
    for (base, mut group) in mains {
        if !target_range.contains_base(base) {
            continue;
        }
        // group length is 1 here for every in-range base
        matches.mains.insert(base, group.remove(0));
    }
    for (base, mut group) in extras {
        if !target_range.contains_base(base) {
            continue;
        }
        group.sort_by(|a, b| {
            a.number
                .cmp(&b.number)
                .then_with(|| a.source_path.cmp(&b.source_path))
        });
        matches.extras.insert(base, group);
    }
    Ok(matches)
}
