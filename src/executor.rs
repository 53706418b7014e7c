//! Bounded-concurrency execution of chapter tasks.
//!
//! With one worker, tasks run strictly sequentially in task-list order,
//! which is the correctness baseline. With more, tasks are dispatched onto tokio
//! tasks gated by a semaphore; every task is self-contained (its own source
//! and destination paths), so the final directory layout is identical for
//! any worker count. A failing task records a `Failed` outcome for its
//! chapter without aborting siblings; there are no retries and no mid-task
//! cancellation.

use std::path::Path;
use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, error, warn};
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};
use crate::types::{ChapterOutcome, ChapterResult, ChapterTask, SkipReason, VolumeResult};

/// Runs the chapter tasks of one volume.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    /// Worker count; `<= 1` means strictly sequential execution.
    pub nb_workers: usize,
    /// Suppress all filesystem mutation, still performing validation.
    pub dry_run: bool,
    /// Destructively replace existing chapter directories.
    pub force: bool,
}

impl Executor {
    pub fn new(nb_workers: usize, dry_run: bool, force: bool) -> Self {
        Self {
            nb_workers,
            dry_run,
            force,
        }
    }

    /// Effective pool size. Extraction is CPU-bound once an archive is open,
    /// so the requested worker count is capped relative to the machine.
    fn pool_size(&self) -> usize {
        self.nb_workers.clamp(1, (num_cpus::get() * 2).max(2))
    }

    /// Executes `tasks` and aggregates their outcomes into a [`VolumeResult`].
    ///
    /// Results are reported in task order regardless of worker count; only
    /// log interleaving differs under concurrency.
    pub async fn run(
        &self,
        series: &str,
        volume: u32,
        tasks: Vec<ChapterTask>,
    ) -> Result<VolumeResult> {
        let mut results = Vec::with_capacity(tasks.len());

        if self.nb_workers <= 1 {
            for task in tasks {
                debug!("[worker] processing chapter {}", task.identity.number);
                results.push(process_task(task, self.dry_run, self.force).await);
            }
        } else {
            let permits = self.pool_size();
            debug!(
                "[worker] dispatching {} task(s) across {} worker(s)",
                tasks.len(),
                permits
            );
            let semaphore = Arc::new(Semaphore::new(permits));
            let mut handles = Vec::with_capacity(tasks.len());

            for task in tasks {
                let semaphore = Arc::clone(&semaphore);
                let dry_run = self.dry_run;
                let force = self.force;
                handles.push(tokio::spawn(async move {
                    match semaphore.acquire().await {
                        Ok(_permit) => process_task(task, dry_run, force).await,
                        Err(e) => ChapterResult {
                            outcome: ChapterOutcome::Failed(e.to_string()),
                            task,
                        },
                    }
                }));
            }

            let joined = try_join_all(handles).await.map_err(Error::Join)?;
            results.extend(joined);
        }

        Ok(VolumeResult {
            series: series.to_string(),
            volume,
            results,
            warnings: Vec::new(),
        })
    }
}

/// Runs one task to completion, folding any error into a `Failed` outcome so
/// sibling tasks keep running.
async fn process_task(task: ChapterTask, dry_run: bool, force: bool) -> ChapterResult {
    let outcome = match execute_task(&task, dry_run, force).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("chapter {} failed: {}", task.identity.number, e);
            ChapterOutcome::Failed(e.to_string())
        }
    };
    ChapterResult { task, outcome }
}

/// The per-chapter sequence: inspect the archive, move it into the volume
/// directory, create the chapter directory, extract into it.
async fn execute_task(task: &ChapterTask, dry_run: bool, force: bool) -> Result<ChapterOutcome> {
    let number = task.identity.number;
    debug!("[worker] start chapter={} file={:?}", number, task.source_path);

    // Both the metadata and the structure check run ahead of any mutation,
    // so dry runs classify tasks exactly as a real run would.
    debug!("[worker] verifying ComicInfo.xml in {:?}", task.source_path);
    let source = task.source_path.clone();
    spawn_blocking(move || inspect_archive(&source)).await??;

    if dry_run {
        debug!(
            "[dry-run] mv {:?} -> {:?}",
            task.source_path,
            task.dest_archive()
        );
        debug!(
            "[dry-run] extract {:?} -> {:?}",
            task.source_path, task.chapter_dir
        );
        return Ok(ChapterOutcome::Skipped(SkipReason::DryRun));
    }

    if !task.volume_dir.exists() {
        debug!("[worker] creating volume dir: {:?}", task.volume_dir);
        fs::create_dir_all(&task.volume_dir).await?;
    }

    let dest_archive = task.dest_archive();
    if task.source_path != dest_archive {
        debug!("[worker] moving archive to {:?}", dest_archive);
        fs::rename(&task.source_path, &dest_archive).await?;
    }

    if task.chapter_dir.exists() {
        if force {
            debug!(
                "[worker] force-remove existing chapter dir: {:?}",
                task.chapter_dir
            );
            fs::remove_dir_all(&task.chapter_dir).await?;
            fs::create_dir_all(&task.chapter_dir).await?;
        } else {
            warn!("chapter dir exists, skipping: {:?}", task.chapter_dir);
            return Ok(ChapterOutcome::Skipped(SkipReason::AlreadyExists));
        }
    } else {
        debug!("[worker] creating chapter dir: {:?}", task.chapter_dir);
        fs::create_dir_all(&task.chapter_dir).await?;
    }

    let archive = dest_archive.clone();
    let chapter_dir = task.chapter_dir.clone();
    spawn_blocking(move || extract_archive(&archive, &chapter_dir)).await??;
    debug!("[worker] extracted {:?} -> {:?}", dest_archive, task.chapter_dir);

    Ok(ChapterOutcome::Success)
}

/// Verifies the archive opens, embeds `ComicInfo.xml`, and carries a flat
/// file list we know how to extract.
fn inspect_archive(path: &Path) -> Result<()> {
    let file = std::fs::File::open(path)?;
    let archive = zip::ZipArchive::new(file)?;

    let has_metadata = archive
        .file_names()
        .any(|name| name.to_ascii_lowercase().ends_with("comicinfo.xml"));
    if !has_metadata {
        return Err(Error::MissingMetadata(path.to_path_buf()));
    }

    for name in archive.file_names() {
        check_flat_entry(path, name)?;
    }
    Ok(())
}

/// Accepts only entries of the flat layout: a bare filename, no directory
/// components, no absolute paths, no traversal. Anything else is surfaced
/// with the detected entry rather than guessed at.
fn check_flat_entry(archive: &Path, name: &str) -> Result<()> {
    let unsupported = |detail: String| Error::UnsupportedArchiveStructure {
        archive: archive.to_path_buf(),
        detail,
    };

    if name.starts_with('/') || name.starts_with('\\') {
        return Err(unsupported(format!("absolute entry path '{}'", name)));
    }
    let parts: Vec<&str> = name.split(['/', '\\']).collect();
    if parts.iter().any(|part| *part == "..") {
        return Err(unsupported(format!("path traversal in entry '{}'", name)));
    }
    if parts.len() > 1 {
        return Err(unsupported(format!(
            "nested entry '{}' (flat file list expected)",
            name
        )));
    }
    Ok(())
}

/// Extracts a flat archive into the chapter directory.
fn extract_archive(archive_path: &Path, chapter_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        // Re-validated here so extraction never trusts a stale inspection.
        check_flat_entry(archive_path, &name)?;
        let mut out = std::fs::File::create(chapter_dir.join(&name))?;
        std::io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn flat_entries_are_accepted() {
        let archive = PathBuf::from("a.cbz");
        assert!(check_flat_entry(&archive, "001.jpg").is_ok());
        assert!(check_flat_entry(&archive, "ComicInfo.xml").is_ok());
    }

    #[test]
    fn unsafe_and_nested_entries_are_rejected() {
        let archive = PathBuf::from("a.cbz");
        for name in ["/abs.jpg", "..\\evil.jpg", "../evil.jpg", "sub/001.jpg", "dir/"] {
            let err = check_flat_entry(&archive, name).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedArchiveStructure { .. }),
                "{} should be rejected",
                name
            );
        }
    }
}
