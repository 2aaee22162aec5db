//! Per-quad application orchestration.
//!
//! [`ApplyPipeline::process_quad`] drives one quad through the full
//! sequence: marker gates, lock acquisition, fetch, mosaic, inference,
//! post-processing, publish, mark. Every quad ends in exactly one of the
//! three marker states or is skipped untouched; scratch space and the
//! lock are reclaimed on every path out, including error returns, via
//! drop guards.

use super::config::ApplyConfig;
use super::error::PipelineError;
use super::paths::{
    DestLayout, CLASSIFICATION_TIF, PROBABILITIES_TIF, REEF_HEATMAP_TIF, REEF_OUTLINE_TIF,
};
use super::publisher::Publisher;
use crate::catalog::QuadCatalog;
use crate::lock::{LockManager, MarkerClient};
use crate::model::{ExternalCommandModel, InferenceError, InferenceModel};
use crate::quad::QuadBlob;
use crate::raster::post::{
    aggregate_coarse, argmax_classify, contains_reef, crop_to_focal3, mask_byte_plane,
    mask_float_bands, reef_heatmap, reef_outline, scale_to_byte, validity_mask,
};
use crate::raster::{
    build_mosaic, open_dataset, read_alpha_band, read_bands_f32, write_byte_bands, ClassMapping,
    RasterError, BYTE_NODATA,
};
use crate::store::StorageContext;
use ndarray::Axis;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How one quad left [`ApplyPipeline::process_quad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadOutcome {
    /// Products published and `application_complete` marked
    Completed,
    /// No reef pixel classified; `no_apply` marked, nothing published
    NoReef,
    /// Source imagery unreadable; `data_corrupt` marked
    CorruptInput,
    /// Skipped: a completion marker already existed (or was repaired)
    AlreadyComplete,
    /// Skipped: a corrupt-data marker already existed
    AlreadyCorrupt,
    /// Skipped: a no-apply marker already existed
    AlreadyNoApply,
    /// Skipped: another worker holds the quad's lock
    Locked,
}

/// Outcome counts for one worker invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub no_reef: usize,
    pub corrupt: usize,
    pub already_complete: usize,
    pub already_corrupt: usize,
    pub already_no_apply: usize,
    pub locked: usize,
}

impl RunSummary {
    /// Quads this worker actually drove to a marker, as opposed to
    /// skipped.
    pub fn processed(&self) -> usize {
        self.completed + self.no_reef + self.corrupt
    }

    fn record(&mut self, outcome: QuadOutcome) {
        match outcome {
            QuadOutcome::Completed => self.completed += 1,
            QuadOutcome::NoReef => self.no_reef += 1,
            QuadOutcome::CorruptInput => self.corrupt += 1,
            QuadOutcome::AlreadyComplete => self.already_complete += 1,
            QuadOutcome::AlreadyCorrupt => self.already_corrupt += 1,
            QuadOutcome::AlreadyNoApply => self.already_no_apply += 1,
            QuadOutcome::Locked => self.locked += 1,
        }
    }
}

/// Scratch directory removed on drop, whatever path the quad takes out.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(root: &Path, label: &str) -> std::io::Result<Self> {
        let path = root.join(format!("{}.{}", label, std::process::id()));
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(scratch = %self.path.display(), error = %e, "failed to remove scratch dir");
        }
    }
}

/// The worker-side application pipeline.
pub struct ApplyPipeline {
    storage: StorageContext,
    locks: LockManager,
    markers: MarkerClient,
    publisher: Publisher,
    model: Arc<dyn InferenceModel>,
    mapping: ClassMapping,
    scratch_root: PathBuf,
    buffer_pixels: usize,
}

impl ApplyPipeline {
    pub fn new(
        storage: StorageContext,
        locks: LockManager,
        publisher: Publisher,
        model: Arc<dyn InferenceModel>,
        mapping: ClassMapping,
        scratch_root: impl Into<PathBuf>,
        buffer_pixels: usize,
    ) -> Self {
        let markers = MarkerClient::new(storage.store_arc(), storage.dest_prefix());
        Self {
            storage,
            locks,
            markers,
            publisher,
            model,
            mapping,
            scratch_root: scratch_root.into(),
            buffer_pixels,
        }
    }

    /// Assemble a pipeline with the production external-command model.
    pub fn from_config(config: &ApplyConfig) -> Result<Self, PipelineError> {
        let storage = config.storage_context();
        let locks = LockManager::new(&config.apply.lock_dir)?;
        let layout = DestLayout::new(
            storage.dest_prefix(),
            &config.apply.response_mapping,
            &config.model.name,
            &config.model.version,
        );
        let publisher = Publisher::new(storage.store_arc(), layout);
        let model: Arc<dyn InferenceModel> = Arc::new(ExternalCommandModel::new(
            &config.model.command,
            config.model.num_classes,
        )?);
        Ok(Self::new(
            storage,
            locks,
            publisher,
            model,
            ClassMapping::default_benthic(),
            config.apply.scratch_dir.clone(),
            config.apply.buffer_pixels,
        ))
    }

    pub fn markers(&self) -> &MarkerClient {
        &self.markers
    }

    /// Build the work catalog from the configured source prefix.
    pub fn catalog(&self) -> Result<QuadCatalog, PipelineError> {
        Ok(QuadCatalog::from_store(
            self.storage.store(),
            self.storage.src_prefix(),
        )?)
    }

    /// Process every quad in the catalog, stopping after `max_quads`
    /// quads of actual work if a limit is given.
    ///
    /// Skips are cheap and never count toward the limit. Any failure
    /// other than corrupt source imagery aborts the run.
    pub fn run(
        &self,
        catalog: &QuadCatalog,
        max_quads: Option<usize>,
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();
        for blob in catalog.quads() {
            if let Some(max) = max_quads {
                if summary.processed() >= max {
                    break;
                }
            }
            let outcome = self.process_quad(blob)?;
            debug!(quad = %blob.label(), ?outcome, "quad handled");
            summary.record(outcome);
        }
        info!(
            completed = summary.completed,
            no_reef = summary.no_reef,
            corrupt = summary.corrupt,
            skipped = summary.already_complete + summary.already_corrupt + summary.already_no_apply,
            locked = summary.locked,
            "run finished"
        );
        Ok(summary)
    }

    /// Drive one quad to a terminal state, or skip it untouched.
    pub fn process_quad(&self, blob: &QuadBlob) -> Result<QuadOutcome, PipelineError> {
        let label = blob.label();

        if self.markers.is_complete(&label)? {
            return Ok(QuadOutcome::AlreadyComplete);
        }
        if self.markers.is_corrupt(&label)? {
            return Ok(QuadOutcome::AlreadyCorrupt);
        }
        if self.markers.is_no_apply(&label)? {
            return Ok(QuadOutcome::AlreadyNoApply);
        }
        if self.publisher.artifacts_exist(&label)? {
            // A predecessor crashed between publishing and marking.
            self.markers.mark_complete(&label)?;
            info!(quad = %label, "repaired missing completion marker");
            return Ok(QuadOutcome::AlreadyComplete);
        }

        let lock = match self.locks.try_acquire(&blob.key())? {
            Some(lock) => lock,
            None => return Ok(QuadOutcome::Locked),
        };
        let scratch = ScratchDir::create(&self.scratch_root, &label)?;

        match self.run_locked(blob, &scratch) {
            Ok(outcome) => {
                lock.release()?;
                Ok(outcome)
            }
            Err(e) if e.is_corrupt_input() => {
                warn!(quad = %label, error = %e, "source imagery corrupt");
                self.markers.mark_corrupt(&label)?;
                lock.release()?;
                Ok(QuadOutcome::CorruptInput)
            }
            // Lock and scratch are reclaimed by their drop guards.
            Err(e) => Err(e),
        }
    }

    fn run_locked(
        &self,
        blob: &QuadBlob,
        scratch: &ScratchDir,
    ) -> Result<QuadOutcome, PipelineError> {
        let label = blob.label();
        let src_dir = scratch.path().join("src");
        std::fs::create_dir_all(&src_dir)?;

        let focal_path = src_dir.join("focal.tif");
        self.storage.store().fetch(blob.object_key(), &focal_path)?;
        let mut context_paths = Vec::with_capacity(blob.context().len());
        for entry in blob.context() {
            let path = src_dir.join(format!("{}.tif", entry.key().label()));
            self.storage.store().fetch(entry.object_key(), &path)?;
            context_paths.push(path);
        }

        let features = scratch.path().join("features.tif");
        let mosaic = build_mosaic(&focal_path, &context_paths, self.buffer_pixels, &features)?;

        let probs_path = scratch.path().join("probabilities_raw.tif");
        self.model.apply(&features, &probs_path)?;

        // The model's output is the model's responsibility: an unreadable
        // probability raster is a model failure, never corrupt source data.
        let probs_ds = open_dataset(&probs_path).map_err(model_output_error)?;
        let bands: Vec<isize> = (1..=self.model.num_classes() as isize).collect();
        let fine = read_bands_f32(&probs_ds, &bands, &probs_path).map_err(model_output_error)?;

        let coarse_full = aggregate_coarse(fine.view(), &self.mapping)?;
        let mut coarse = crop_to_focal3(coarse_full.view(), self.buffer_pixels)?;

        let focal_ds = open_dataset(&focal_path)?;
        let valid = read_alpha_band(&focal_ds, &focal_path)?.map(|a| validity_mask(a.view()));
        if let Some(valid) = &valid {
            mask_float_bands(&mut coarse, valid)?;
        }
        let mut classification = argmax_classify(coarse.view(), &self.mapping);
        if let Some(valid) = &valid {
            mask_byte_plane(&mut classification, valid)?;
        }

        if !contains_reef(classification.view(), &self.mapping) {
            self.markers.mark_no_apply(&label)?;
            info!(quad = %label, "no reef classified; closed with no_apply");
            return Ok(QuadOutcome::NoReef);
        }

        let out_dir = scratch.path().join("out");
        std::fs::create_dir_all(&out_dir)?;
        let geo = mosaic.focal_geo();
        let srs = focal_ds.spatial_ref().ok();

        let byte_probs = scale_to_byte(coarse.view());
        let heat = reef_heatmap(coarse.view(), &self.mapping);
        let heat_bytes = scale_to_byte(heat.view().insert_axis(Axis(0)));
        let outline = reef_outline(classification.view(), &self.mapping);

        write_byte_bands(
            &out_dir.join(CLASSIFICATION_TIF),
            classification.view().insert_axis(Axis(0)),
            geo,
            srs.as_ref(),
            BYTE_NODATA,
        )?;
        write_byte_bands(
            &out_dir.join(PROBABILITIES_TIF),
            byte_probs.view(),
            geo,
            srs.as_ref(),
            BYTE_NODATA,
        )?;
        write_byte_bands(
            &out_dir.join(REEF_HEATMAP_TIF),
            heat_bytes.view(),
            geo,
            srs.as_ref(),
            BYTE_NODATA,
        )?;
        write_byte_bands(
            &out_dir.join(REEF_OUTLINE_TIF),
            outline.view().insert_axis(Axis(0)),
            geo,
            srs.as_ref(),
            BYTE_NODATA,
        )?;

        self.publisher.publish(&label, &out_dir)?;
        self.markers.mark_complete(&label)?;
        info!(quad = %label, "application complete");
        Ok(QuadOutcome::Completed)
    }
}

fn model_output_error(e: RasterError) -> PipelineError {
    PipelineError::Inference(InferenceError::Failed(format!(
        "unreadable model output: {}",
        e
    )))
}
