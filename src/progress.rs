//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgress>`] via
//! [`crate::Pipeline::with_progress`] to be told as each submission moves
//! through the stages. The CLI uses it to drive a spinner; the server leaves
//! it unset.
//!
//! # Example
//!
//! ```rust
//! use surat_pengajuan::{PipelineProgress, Stage};
//! use std::sync::Mutex;
//!
//! struct Log(Mutex<Vec<Stage>>);
//!
//! impl PipelineProgress for Log {
//!     fn on_stage_start(&self, stage: Stage) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

/// One step of a submission, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SaveUpload,
    ExtractText,
    ExtractFields,
    RenderLetter,
    ConvertPdf,
}

impl Stage {
    /// Short user-facing description.
    pub fn label(self) -> &'static str {
        match self {
            Stage::SaveUpload => "Menyimpan file",
            Stage::ExtractText => "Membaca teks PDF",
            Stage::ExtractFields => "Mengekstrak informasi",
            Stage::RenderLetter => "Membuat surat",
            Stage::ConvertPdf => "Mengonversi ke PDF",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as a submission moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgress: Send + Sync {
    /// Called just before `stage` begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when `stage` finished without a fatal error.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when `stage` failed; no further stages run.
    ///
    /// # Arguments
    /// * `error` — human-readable error description
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl PipelineProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::Pipeline`].
pub type ProgressCallback = Arc<dyn PipelineProgress>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl PipelineProgress for Counting {
        fn on_stage_start(&self, _stage: Stage) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_complete(&self, _stage: Stage) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_error(&self, _stage: Stage, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_does_not_panic() {
        let cb: ProgressCallback = Arc::new(NoopProgress);
        cb.on_stage_start(Stage::ExtractText);
        cb.on_stage_complete(Stage::ExtractText);
        cb.on_stage_error(Stage::ConvertPdf, "soffice missing");
    }

    #[test]
    fn counting_receives_events() {
        let cb = Counting::default();
        cb.on_stage_start(Stage::SaveUpload);
        cb.on_stage_complete(Stage::SaveUpload);
        cb.on_stage_start(Stage::ExtractText);
        cb.on_stage_error(Stage::ExtractText, "no text");
        assert_eq!(cb.starts.load(Ordering::SeqCst), 2);
        assert_eq!(cb.completes.load(Ordering::SeqCst), 1);
        assert_eq!(cb.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stage_labels_are_indonesian() {
        assert_eq!(Stage::ConvertPdf.to_string(), "Mengonversi ke PDF");
    }
}
