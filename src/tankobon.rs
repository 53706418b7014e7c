//! The main packing configuration and pipeline entry points.
//!
//! [`TankobonConfig`] is built declaratively with the builder pattern and
//! drives the full pipeline for one volume or an ordered batch: scan the
//! source directory, match archives against the resolved chapter range,
//! plan per-chapter tasks, and execute them with bounded concurrency.
//!
//! Resolution and matching failures abort a volume before any filesystem
//! mutation; per-chapter failures during execution are collected into the
//! volume's aggregate result instead.

use std::path::{Path, PathBuf};

use log::{error, info, warn};
use regex::Regex;
use tokio::fs;

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::matcher::{find_archives, match_chapters};
use crate::pattern::{NamingPattern, resolve_pattern};
use crate::plan::{build_tasks, format_volume_dir};
use crate::range::{resolve_batch, resolve_range};
use crate::types::{ChapterRange, VolumeResult, VolumeSpec};

/// Configuration for a packing run, built via [`TankobonConfig::builder`].
///
/// ```rust,no_run
/// # use tankobon::prelude::*;
/// # use std::path::PathBuf;
/// let config = TankobonConfig::builder()
///     .series("Berserk")
///     .source_path(PathBuf::from("./incoming"))
///     .nb_workers(4usize)
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct TankobonConfig {
    /// Series name used to title volume directories (`"<series> v<NN>"`).
    pub series: String,

    /// Directory scanned for chapter archives.
    pub source_path: PathBuf,

    /// Destination root for volume directories. Defaults to `source_path`.
    #[builder(default)]
    pub dest_path: Option<PathBuf>,

    /// Named filename pattern from the registry (`default` when unset).
    #[builder(default)]
    pub pattern: Option<String>,

    /// Explicit main-chapter regex; takes precedence over `pattern`.
    /// Must capture the chapter number as group 1.
    #[builder(default)]
    pub chapter_regex_str: Option<String>,

    /// Explicit extra-chapter regex; must capture the base number as group 1
    /// and the fractional suffix as group 2.
    #[builder(default)]
    pub extra_regex_str: Option<String>,

    /// Worker count for chapter tasks within a volume. Volumes of a batch
    /// are never parallelized against each other.
    #[builder(default = "1")]
    pub nb_workers: usize,

    /// Perform every decision and validation but mutate nothing.
    #[builder(default)]
    pub dry_run: bool,

    /// Destructively replace chapter directories that already exist.
    #[builder(default)]
    pub force: bool,
}

impl TankobonConfig {
    /// Creates a new builder for configuring `TankobonConfig`.
    pub fn builder() -> TankobonConfigBuilder {
        TankobonConfigBuilder::default()
    }

    /// Destination root, falling back to the source directory.
    pub fn dest_root(&self) -> &Path {
        self.dest_path.as_deref().unwrap_or(&self.source_path)
    }

    /// Resolves the active naming pattern for this configuration.
    pub fn naming_pattern(&self) -> Result<NamingPattern> {
        resolve_pattern(
            self.pattern.as_deref(),
            self.chapter_regex_str.as_deref(),
            self.extra_regex_str.as_deref(),
        )
    }

    /// Validates the configuration against the filesystem without mutating
    /// anything. All `pack*` methods call this first.
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.series.trim().is_empty() {
            return Err(Error::Other("Series name is required".to_string()));
        }
        if self.source_path.as_os_str().is_empty() {
            return Err(Error::Other("`source_path` must be set".to_string()));
        }
        crate::path_utils::validate_path(&self.source_path)?;
        if !self.source_path.exists() {
            return Err(Error::NotFound(format!(
                "Source path does not exist: {:?}",
                self.source_path
            )));
        }
        if !self.source_path.is_dir() {
            return Err(Error::InvalidPath(
                self.source_path.clone(),
                "Source path is not a directory.".to_string(),
            ));
        }
        // Surface pattern problems before any scanning happens.
        self.naming_pattern()?;
        Ok(self)
    }

    /// Builds the volume spec for this configuration's series.
    pub fn volume_spec(&self, volume: u32, range: ChapterRange) -> VolumeSpec {
        VolumeSpec {
            series: self.series.clone(),
            volume,
            range,
        }
    }

    /// Packs a single volume: scan, match, plan, execute.
    ///
    /// The existing volume directory (if any) is scanned alongside the
    /// source root so re-running with unchanged inputs finds the archives it
    /// already moved and skips them instead of reporting them missing.
    pub async fn pack(&self, spec: &VolumeSpec) -> Result<VolumeResult> {
        self.preflight_check()?;
        let pattern = self.naming_pattern()?;
        let dest_root = self.dest_root().to_path_buf();
        let volume_dir = dest_root.join(format_volume_dir(&spec.series, spec.volume));

        let mut listing = find_archives(&self.source_path).await?;
        if volume_dir.is_dir() {
            listing.extend(find_archives(&volume_dir).await?);
        }

        let matches = match_chapters(&listing, &pattern, &spec.range)?;
        let tasks = build_tasks(spec, &matches, &dest_root);

        info!("planned tasks for volume {:02}:", spec.volume);
        for task in &tasks {
            info!(
                " chapter {} -> {:?}",
                task.identity.number, task.source_path
            );
        }

        let mut warnings = Vec::new();
        if volume_dir.exists() {
            warn!("volume dir exists: {:?}", volume_dir);
            warnings.push(format!(
                "volume directory already exists: {:?}",
                volume_dir
            ));
        } else if !self.dry_run {
            // Created here, before dispatch, so workers never race on it.
            fs::create_dir_all(&volume_dir).await?;
        }

        let executor = Executor::new(self.nb_workers, self.dry_run, self.force);
        let mut result = executor.run(&spec.series, spec.volume, tasks).await?;
        result.warnings = warnings;
        Ok(result)
    }

    /// Convenience: resolve `expression` and pack it as `volume`.
    pub async fn pack_volume(&self, volume: u32, expression: &str) -> Result<VolumeResult> {
        let range = resolve_range(expression)?;
        self.pack(&self.volume_spec(volume, range)).await
    }

    /// Packs an ordered batch of volumes, strictly sequentially.
    ///
    /// A volume whose aggregate result failed stops the batch after being
    /// recorded; resolution and matching errors abort it outright.
    pub async fn pack_batch(&self, specs: &[VolumeSpec]) -> Result<Vec<VolumeResult>> {
        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            let result = self.pack(spec).await?;
            let failed = !result.succeeded();
            results.push(result);
            if failed {
                error!("volume {:02} failed; stopping batch", spec.volume);
                break;
            }
        }
        Ok(results)
    }

    /// Convenience: resolve a `"v01:1..3-v02:4..6"` expression for this
    /// series and pack it.
    pub async fn pack_batch_expression(&self, expression: &str) -> Result<Vec<VolumeResult>> {
        let specs = resolve_batch(&self.series, expression)?;
        self.pack_batch(&specs).await
    }
}

impl TankobonConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        // Validate custom regexes if they are provided
        if let Some(Some(s)) = &self.chapter_regex_str {
            if Regex::new(s).is_err() {
                return Err(format!("Invalid chapter_regex: {}", s));
            }
        }
        if let Some(Some(s)) = &self.extra_regex_str {
            if Regex::new(s).is_err() {
                return Err(format!("Invalid extra_regex: {}", s));
            }
        }
        if let Some(0) = self.nb_workers {
            return Err("Worker count must be at least 1.".to_string());
        }
        Ok(())
    }

    /// Fills unset fields from a source-directory config file.
    /// Values already set on the builder always win over file values.
    pub fn apply_source_config(&mut self, config: &SourceConfig) -> &mut Self {
        if self.series.is_none() {
            if let Some(series) = &config.series {
                self.series = Some(series.clone());
            }
        }
        if self.pattern.is_none() {
            if let Some(pattern) = &config.pattern {
                self.pattern = Some(Some(pattern.clone()));
            }
        }
        if self.chapter_regex_str.is_none() {
            if let Some(regex) = &config.chapter_regex {
                self.chapter_regex_str = Some(Some(regex.clone()));
            }
        }
        if self.extra_regex_str.is_none() {
            if let Some(regex) = &config.extra_regex {
                self.extra_regex_str = Some(Some(regex.clone()));
            }
        }
        if self.nb_workers.is_none() {
            if let Some(workers) = config.workers {
                self.nb_workers = Some(workers);
            }
        }
        self
    }
}
