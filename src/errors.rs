use std::path::PathBuf;

use thiserror::Error;

/// Segmentation failure. Segmentation is required before anything can be
/// translated for a line, so these abort the whole document translation.
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// No tagger is configured for the morphological (JA->EN) direction.
    #[error("word-segmentation tagger unavailable: {0}")]
    TaggerUnavailable(String),

    /// The tagger itself rejected a sentence unit.
    #[error("tagger failed on {unit:?}: {message}")]
    TaggerFailed { unit: String, message: String },
}

/// A segment produced zero subword tokens. Recovered locally: the segment is
/// mapped to an empty translation at its batch position, never surfaced.
#[derive(Error, Debug)]
#[error("segment {index} encoded to zero tokens")]
pub struct EncodingError {
    pub index: usize,
}

/// Batch translator contract violations. Fatal for the whole call: a short or
/// reordered result set would silently misalign segments to lines.
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("translation backend failed: {0}")]
    Backend(String),

    #[error("batch result count mismatch: sent {expected}, got {returned}")]
    CountMismatch { expected: usize, returned: usize },
}

/// Postprocessing failure on a single sentence. Recovered locally by falling
/// back to the unmodified decoded text; logged, never surfaced.
#[derive(Error, Debug)]
pub enum PostprocessError {
    #[error("detokenization produced an empty result")]
    EmptyDetokenization,

    #[error("true-casing received an empty sentence")]
    EmptyInput,
}

/// Model bundle loading failure. Surfaced before any translation is attempted.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("required model file missing: {0}")]
    MissingFile(PathBuf),

    #[error("model file corrupt: {path} ({reason})")]
    Corrupt { path: PathBuf, reason: String },

    #[error("inference engine rejected model: {0}")]
    Engine(String),

    #[error("no engine compiled in for {0} (build with the `ctranslate2` feature)")]
    EngineUnavailable(String),
}

/// Document-level error of one `translate` call. Distinguishable from a
/// successful empty translation; sentence-level failures never reach here.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("segmentation failed at line {line}: {source}")]
    Segmentation {
        line: usize,
        source: SegmentationError,
    },

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_position_detail() {
        let err = TranslateError::Segmentation {
            line: 3,
            source: SegmentationError::TaggerUnavailable("no tagger".into()),
        };
        assert!(err.to_string().contains("line 3"));

        let err = TranslationError::CountMismatch {
            expected: 4,
            returned: 3,
        };
        assert!(err.to_string().contains("sent 4"));
        assert!(err.to_string().contains("got 3"));
    }
}
