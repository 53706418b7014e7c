//! Canonical output naming and per-volume task planning.
//!
//! Destination paths are a pure function of `(series, volume, identity)`:
//! volume directories are `"<series> v<NN>"` and chapter directories are
//! `"Chapter NNN"` with a fractional suffix for extras, zero-padded so that
//! lexical order equals numeric order.

use std::collections::BTreeSet;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::matcher::ChapterMatches;
use crate::path_utils::sanitize_filename;
use crate::types::{ChapterIdentity, ChapterNumber, ChapterTask, VolumeSpec};

lazy_static! {
    static ref CHAPTER_DIR_REGEX: Regex =
        Regex::new(r"^Chapter ([0-9]{3,})(?:\.([0-9]+))?$").unwrap();
}

/// Formats the volume directory name: `"Berserk v01"`, `"Berserk v100"`.
///
/// Volumes 1–99 are zero-padded to two digits; wider volumes use their
/// natural width. The series component is sanitized for filesystem-hostile
/// characters.
pub fn format_volume_dir(series: &str, volume: u32) -> String {
    format!("{} v{:02}", sanitize_filename(series), volume)
}

/// Formats the chapter directory name: `"Chapter 003"`, `"Chapter 016.5"`.
pub fn format_chapter_dir(number: ChapterNumber) -> String {
    match number.extra {
        Some(extra) => format!("Chapter {:03}.{}", number.base, extra),
        None => format!("Chapter {:03}", number.base),
    }
}

/// Parses a chapter directory name back into its number.
/// Round-trips with [`format_chapter_dir`].
pub fn parse_chapter_dir(name: &str) -> Option<ChapterNumber> {
    let caps = CHAPTER_DIR_REGEX.captures(name)?;
    let base = caps.get(1)?.as_str().parse::<u32>().ok()?;
    match caps.get(2) {
        Some(extra) => Some(ChapterNumber::extra(base, extra.as_str().parse().ok()?)),
        None => Some(ChapterNumber::main(base)),
    }
}

/// Builds the ordered task list for one volume.
///
/// Chapters are emitted in ascending order, each main before its extras and
/// extras in fractional order. An integer range entry pulls in every extra
/// sharing its base; a decimal entry pulls in exactly the requested extra
/// (and never duplicates one already covered by its base).
pub fn build_tasks(
    spec: &VolumeSpec,
    matches: &ChapterMatches,
    dest_root: &Path,
) -> Vec<ChapterTask> {
    let volume_dir = dest_root.join(format_volume_dir(&spec.series, spec.volume));

    let bases: BTreeSet<u32> = spec.range.iter().map(|n| n.base).collect();
    let mut tasks = Vec::new();

    for base in bases {
        let whole_chapter = spec.range.contains(ChapterNumber::main(base));

        if whole_chapter {
            if let Some(main) = matches.mains.get(&base) {
                tasks.push(task_for(main.clone(), &volume_dir));
            }
        }

        for identity in matches.extras.get(&base).into_iter().flatten() {
            if whole_chapter || spec.range.contains(identity.number) {
                tasks.push(task_for(identity.clone(), &volume_dir));
            }
        }
    }
    tasks
}

fn task_for(identity: ChapterIdentity, volume_dir: &Path) -> ChapterTask {
    let chapter_dir = volume_dir.join(format_chapter_dir(identity.number));
    let source_path = identity.source_path.clone();
    ChapterTask {
        identity,
        source_path,
        volume_dir: volume_dir.to_path_buf(),
        chapter_dir,
    }
}
