//! Export orchestration
//!
//! Walks the ordered favorites, derives each item's output names from its
//! position, materializes the still and the paired motion clip, and hands
//! selfies to the mirror post-processor. A failing item is logged with its
//! sequence index and the run moves on to the next one.

use crate::config::Config;
use crate::error::Result;
use crate::fsops::transfer_file;
use crate::library::{LibraryItem, LibraryProvider, select_favorites};
use crate::mirror::{AssetMirror, FfmpegTranscoder, MirrorProcessor, MirrorReport, VideoTranscoder};
use crate::naming::ExportPlan;
use crate::range::DateRange;
use crate::status::RunContext;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, error, info, span, warn};

/// Still component outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StillOutcome {
    Exported(PathBuf),
    /// Left out by the exclude-live-stills option
    Skipped,
}

/// Motion component outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotionOutcome {
    Exported(PathBuf),
    /// Item is live but the library has no motion clip on disk
    Missing,
    /// Item is not a live photo
    NotLive,
}

/// Outcome of exporting one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported {
        still: StillOutcome,
        motion: MotionOutcome,
    },
    /// Dry run: names derived, nothing written
    Planned,
    Failed {
        error: String,
    },
}

/// Result of exporting one item
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Derived names and sequence index
    pub plan: ExportPlan,
    /// Library identifier of the item
    pub item_id: String,
    /// Original filename of the item
    pub original_filename: String,
    pub outcome: ExportOutcome,
    /// Selfie mirroring result, when mirroring ran
    pub mirror: Option<MirrorReport>,
}

impl ExportResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ExportOutcome::Failed { .. })
    }
}

/// Export statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub total_items: usize,
    pub stills_exported: usize,
    pub stills_skipped: usize,
    pub motion_exported: usize,
    pub motion_missing: usize,
    pub planned: usize,
    pub failed: usize,
    pub mirrored: usize,
    pub already_mirrored: usize,
    pub mirror_failed: usize,
}

impl ExportStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one item result into the counters
    pub fn record(&mut self, result: &ExportResult) {
        self.total_items += 1;

        match &result.outcome {
            ExportOutcome::Exported { still, motion } => {
                match still {
                    StillOutcome::Exported(_) => self.stills_exported += 1,
                    StillOutcome::Skipped => self.stills_skipped += 1,
                }
                match motion {
                    MotionOutcome::Exported(_) => self.motion_exported += 1,
                    MotionOutcome::Missing => self.motion_missing += 1,
                    MotionOutcome::NotLive => {}
                }
            }
            ExportOutcome::Planned => self.planned += 1,
            ExportOutcome::Failed { .. } => self.failed += 1,
        }

        if let Some(report) = &result.mirror {
            for asset in [&report.primary, &report.motion] {
                match asset {
                    AssetMirror::Mirrored => self.mirrored += 1,
                    AssetMirror::AlreadyMirrored => self.already_mirrored += 1,
                    AssetMirror::Failed(_) => self.mirror_failed += 1,
                    AssetMirror::Absent | AssetMirror::Disabled | AssetMirror::Unsupported => {}
                }
            }
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Items: {}, Stills: {}, Stills skipped: {}, Motion: {}, Motion missing: {}, Failed: {}, Mirrored: {}, Already mirrored: {}, Mirror failures: {}",
            self.total_items,
            self.stills_exported,
            self.stills_skipped,
            self.motion_exported,
            self.motion_missing,
            self.failed,
            self.mirrored,
            self.already_mirrored,
            self.mirror_failed
        )
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub destination: PathBuf,
    pub results: Vec<ExportResult>,
    pub stats: ExportStats,
}

impl ExportReport {
    pub fn failed(&self) -> impl Iterator<Item = &ExportResult> {
        self.results.iter().filter(|r| r.is_failed())
    }
}

/// Exports favorites into one destination folder
pub struct Exporter {
    config: Config,
    destination: PathBuf,
    mirror: Option<MirrorProcessor>,
}

impl Exporter {
    /// Exporter using ffmpeg from the configuration for video mirroring
    pub fn new(config: Config, destination: PathBuf) -> Self {
        let transcoder = FfmpegTranscoder::new(config.ffmpeg_path.clone());
        Self::with_transcoder(config, destination, Box::new(transcoder))
    }

    /// Exporter with a caller supplied video transcoder
    pub fn with_transcoder(
        config: Config,
        destination: PathBuf,
        transcoder: Box<dyn VideoTranscoder>,
    ) -> Self {
        let mirror = config
            .mirror_selfies
            .then(|| MirrorProcessor::new(&config, transcoder));
        Self {
            config,
            destination,
            mirror,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Select favorites in `range` and export them
    ///
    /// Only library and destination setup failures are returned as errors;
    /// per-item failures end up in the report.
    pub fn run(
        &self,
        ctx: &mut RunContext,
        provider: &dyn LibraryProvider,
        range: &DateRange,
    ) -> Result<ExportReport> {
        let _span = ctx.span().clone().entered();

        let favorites = select_favorites(ctx, provider, range)?;

        if !self.config.dry_run {
            fs::create_dir_all(&self.destination)?;
        }
        info!(
            destination = %self.destination.display(),
            count = favorites.len(),
            "Exporting favorited media"
        );

        Ok(self.export_selection(provider, range, &favorites))
    }

    /// Export an already selected, ordered sequence
    pub fn export_selection(
        &self,
        provider: &dyn LibraryProvider,
        range: &DateRange,
        items: &[LibraryItem],
    ) -> ExportReport {
        let mut stats = ExportStats::new();
        let mut results = Vec::with_capacity(items.len());

        for (position, item) in items.iter().enumerate() {
            let plan = ExportPlan::for_item(position + 1, range, item, self.config.exclude_live_stills);
            let result = self.export_one(provider, item, plan);
            stats.record(&result);
            results.push(result);
        }

        info!("{}", stats.summary());

        ExportReport {
            destination: self.destination.clone(),
            results,
            stats,
        }
    }

    fn export_one(
        &self,
        provider: &dyn LibraryProvider,
        item: &LibraryItem,
        plan: ExportPlan,
    ) -> ExportResult {
        let _item_span = span!(Level::DEBUG, "export_item", index = plan.index).entered();

        let mut result = ExportResult {
            item_id: item.id.clone(),
            original_filename: item.original_filename.clone(),
            outcome: ExportOutcome::Planned,
            mirror: None,
            plan,
        };

        if self.config.dry_run {
            info!(
                index = result.plan.index,
                still = %result.plan.still_name,
                motion = ?result.plan.motion_name,
                skip_still = result.plan.skip_still,
                "Would export item"
            );
            return result;
        }

        match self.export_item(provider, item, &result.plan) {
            Ok((still, motion)) => {
                if let Some(mirror) = &self.mirror {
                    let primary = match &still {
                        StillOutcome::Exported(path) => Some(path.as_path()),
                        StillOutcome::Skipped => None,
                    };
                    let motion_path = match &motion {
                        MotionOutcome::Exported(path) => Some(path.as_path()),
                        _ => None,
                    };
                    result.mirror = mirror.process(item, primary, motion_path);
                }
                result.outcome = ExportOutcome::Exported { still, motion };
            }
            Err(e) => {
                error!(
                    index = result.plan.index,
                    item = %item.original_filename,
                    error = %e,
                    "Failed to export item"
                );
                result.outcome = ExportOutcome::Failed {
                    error: e.to_string(),
                };
            }
        }

        result
    }

    fn export_item(
        &self,
        provider: &dyn LibraryProvider,
        item: &LibraryItem,
        plan: &ExportPlan,
    ) -> Result<(StillOutcome, MotionOutcome)> {
        let dir = self
            .destination
            .join(self.config.subdirectory_for(&item.captured_at));

        let still = if plan.skip_still {
            info!(index = plan.index, still = %plan.still_name, "Skipped still of live photo");
            StillOutcome::Skipped
        } else {
            let dest = dir.join(&plan.still_name);
            provider.export_still(item, &dest)?;
            info!(index = plan.index, still = %plan.still_name, "Exported still");
            StillOutcome::Exported(dest)
        };

        let motion = match (&plan.motion_name, item.is_live) {
            (Some(name), true) => match provider.motion_path(item) {
                Some(source) => {
                    let dest = dir.join(name);
                    transfer_file(&source, &dest, self.config.operation)?;
                    info!(index = plan.index, motion = %name, "Exported live photo video");
                    MotionOutcome::Exported(dest)
                }
                None => {
                    warn!(
                        index = plan.index,
                        item = %item.original_filename,
                        "Live photo has no motion clip in the library"
                    );
                    MotionOutcome::Missing
                }
            },
            _ => MotionOutcome::NotLive,
        };

        Ok((still, motion))
    }
}
