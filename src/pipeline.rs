use std::sync::Arc;

use crate::bundle::{BundleCache, BundleLoader, ModelBundle};
use crate::direction::Direction;
use crate::errors::{SegmentationError, TranslateError, TranslationError};
use crate::postprocess::{finish_en, finish_ja, TrueCaser};
use crate::segment::{segment_en_line, segment_ja_line, Segment, Tagger};
use crate::subword::{decode_batch, encode_segments, Encoded};
use crate::translator::translate_checked;

/// Document translation pipeline: per-direction model bundles behind a
/// single-flight cache, one shared wakati tagger, one shared truecaser.
pub struct Pipeline {
    bundles: BundleCache,
    tagger: Option<Box<dyn Tagger>>,
    truecaser: TrueCaser,
}

impl Pipeline {
    /// Recommended input bound, matching the hosting UI's cap. Not enforced
    /// here: the whole segment batch of a document goes to the translator as
    /// one unchunked call, so very large inputs are the caller's problem.
    pub const RECOMMENDED_MAX_CHARS: usize = 2000;

    pub fn new(loader: Box<dyn BundleLoader>) -> Self {
        Self {
            bundles: BundleCache::new(loader),
            tagger: None,
            truecaser: TrueCaser::default(),
        }
    }

    pub fn with_tagger(mut self, tagger: Box<dyn Tagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn with_truecaser(mut self, truecaser: TrueCaser) -> Self {
        self.truecaser = truecaser;
        self
    }

    /// Translate a whole document. Loads (or reuses) the direction's bundle,
    /// then runs the line-preserving segment/encode/translate/decode/finish
    /// pipeline.
    pub fn translate(&self, document: &str, direction: Direction) -> Result<String, TranslateError> {
        let bundle: Arc<ModelBundle> = self.bundles.get(direction)?;
        translate_with_bundle(
            document,
            direction,
            &bundle,
            self.tagger.as_deref(),
            &self.truecaser,
        )
    }
}

/// Core orchestration over an explicit bundle. Invariants: output line count
/// equals input line count, always; batch order is stable and is the single
/// source of truth for mapping results back to lines — segments are never
/// dropped or reordered, and a segment that fails encoding contributes an
/// empty translation at its position.
pub fn translate_with_bundle(
    document: &str,
    direction: Direction,
    bundle: &ModelBundle,
    tagger: Option<&dyn Tagger>,
    truecaser: &TrueCaser,
) -> Result<String, TranslateError> {
    if document.is_empty() {
        return Ok(String::new());
    }

    // Case information carries no signal in the EN source orthography and
    // folding improves model coverage; fold before segmentation.
    let folded;
    let source = match direction {
        Direction::EnJa => {
            folded = document.to_lowercase();
            folded.as_str()
        }
        Direction::JaEn => document,
    };

    let mut segments: Vec<Segment> = Vec::new();
    let mut per_line_counts: Vec<usize> = Vec::new();
    for (line_index, line) in source.split('\n').enumerate() {
        let segs = match direction {
            Direction::EnJa => segment_en_line(line, line_index),
            Direction::JaEn => {
                let tagger = tagger.ok_or_else(|| TranslateError::Segmentation {
                    line: line_index,
                    source: SegmentationError::TaggerUnavailable(
                        "no word-segmentation tagger configured".to_string(),
                    ),
                })?;
                segment_ja_line(line, line_index, tagger)
                    .map_err(|source| TranslateError::Segmentation { line: line_index, source })?
            }
        };
        per_line_counts.push(segs.len());
        segments.extend(segs);
    }

    let encoded = encode_segments(&*bundle.sp_source, &segments)
        .map_err(|e| TranslationError::Backend(format!("subword encode: {e}")))?;
    let batch: Vec<Vec<String>> = encoded
        .iter()
        .filter_map(|slot| match slot {
            Encoded::Tokens(tokens) => Some(tokens.clone()),
            Encoded::Empty => None,
        })
        .collect();

    let translated = translate_checked(&*bundle.translator, &batch)?;
    let decoded = decode_batch(&*bundle.sp_target, &translated)
        .map_err(|e| TranslationError::Backend(format!("subword decode: {e}")))?;

    // Re-interleave decoded strings with the withheld zero-token slots so
    // positions line up with the segment batch again.
    let mut decoded_iter = decoded.into_iter();
    let mut outputs: Vec<String> = Vec::with_capacity(encoded.len());
    for slot in &encoded {
        match slot {
            Encoded::Tokens(_) => {
                let next = decoded_iter.next().ok_or(TranslationError::CountMismatch {
                    expected: batch.len(),
                    returned: outputs.len(),
                })?;
                outputs.push(next);
            }
            Encoded::Empty => outputs.push(String::new()),
        }
    }

    let mut out_lines: Vec<String> = Vec::with_capacity(per_line_counts.len());
    let mut cursor = 0usize;
    for &count in &per_line_counts {
        let line_segments = &segments[cursor..cursor + count];
        let line_outputs = &outputs[cursor..cursor + count];
        cursor += count;
        out_lines.push(match direction {
            Direction::EnJa => finish_ja(line_outputs),
            Direction::JaEn => assemble_en_line(line_segments, line_outputs, truecaser),
        });
    }
    Ok(out_lines.join("\n"))
}

/// JA->EN per-line assembly: finish each sentence, re-insert embedded line
/// breaks recorded by the segmenter, concatenate with no added separator.
fn assemble_en_line(segments: &[Segment], outputs: &[String], truecaser: &TrueCaser) -> String {
    let mut line = String::new();
    for (segment, decoded) in segments.iter().zip(outputs) {
        if segment.restore_break {
            line.push('\n');
        }
        if decoded.is_empty() {
            continue;
        }
        line.push_str(&finish_en(decoded, truecaser));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ModelLoadError;
    use crate::subword::testing::WhitespaceModel;
    use crate::subword::SubwordModel;
    use crate::translator::testing::{IdentityTranslator, ShortTranslator};

    struct EchoTagger;

    impl Tagger for EchoTagger {
        fn wakati(&self, unit: &str) -> Result<String, SegmentationError> {
            Ok(unit.to_string())
        }
    }

    struct BrokenTagger;

    impl Tagger for BrokenTagger {
        fn wakati(&self, unit: &str) -> Result<String, SegmentationError> {
            Err(SegmentationError::TaggerFailed {
                unit: unit.to_string(),
                message: "tagger process died".to_string(),
            })
        }
    }

    fn identity_bundle() -> ModelBundle {
        ModelBundle {
            translator: Box::new(IdentityTranslator),
            sp_source: Box::new(WhitespaceModel),
            sp_target: Box::new(WhitespaceModel),
        }
    }

    fn translate(doc: &str, direction: Direction, bundle: &ModelBundle) -> Result<String, TranslateError> {
        translate_with_bundle(doc, direction, bundle, Some(&EchoTagger), &TrueCaser::default())
    }

    fn line_count(s: &str) -> usize {
        s.split('\n').count()
    }

    #[test]
    fn empty_document_translates_to_empty_document() {
        let bundle = identity_bundle();
        assert_eq!(translate("", Direction::EnJa, &bundle).unwrap(), "");
        assert_eq!(translate("", Direction::JaEn, &bundle).unwrap(), "");
    }

    #[test]
    fn blank_lines_round_trip() {
        let bundle = identity_bundle();
        for direction in Direction::ALL {
            let out = translate("\n\n", direction, &bundle).unwrap();
            assert_eq!(out, "\n\n");
        }
    }

    #[test]
    fn line_counts_are_preserved() {
        let bundle = identity_bundle();
        let docs = [
            "one line.",
            "first.\n\nthird. fourth.\n",
            "こんにちは。\n\nさようなら。",
        ];
        for doc in docs {
            for direction in Direction::ALL {
                let out = translate(doc, direction, &bundle).unwrap();
                assert_eq!(line_count(&out), line_count(doc), "doc {doc:?} dir {direction}");
            }
        }
    }

    #[test]
    fn en_ja_identity_is_case_folded_input() {
        let bundle = identity_bundle();
        let out = translate("Hello world.\nGood morning.", Direction::EnJa, &bundle).unwrap();
        assert_eq!(out, "hello world.\ngood morning.");
    }

    #[test]
    fn ja_en_identity_keeps_lines_and_order() {
        let bundle = identity_bundle();
        let out = translate("これはテスト。\nはい。", Direction::JaEn, &bundle).unwrap();
        assert_eq!(out, "これはテスト。\nはい。");
    }

    #[test]
    fn no_cross_line_leakage() {
        let bundle = identity_bundle();
        let out = translate("alpha beta.\ngamma delta.", Direction::EnJa, &bundle).unwrap();
        let lines: Vec<&str> = out.split('\n').collect();
        assert!(lines[0].contains("alpha") && !lines[0].contains("gamma"));
        assert!(lines[1].contains("gamma") && !lines[1].contains("alpha"));
    }

    #[test]
    fn embedded_break_is_reproduced_in_ja_en_output() {
        let bundle = identity_bundle();
        let out = translate("こんにちは\n世界。", Direction::JaEn, &bundle).unwrap();
        assert_eq!(out, "こんにちは\n世界。");
    }

    #[test]
    fn restore_break_marker_reinserts_break_within_a_line() {
        let segments = segment_ja_line("こんにちは\n世界。", 0, &EchoTagger).unwrap();
        let outputs: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let line = assemble_en_line(&segments, &outputs, &TrueCaser::default());
        assert_eq!(line, "こんにちは\n世界。");
    }

    #[test]
    fn batch_count_mismatch_aborts_with_translation_error() {
        let bundle = ModelBundle {
            translator: Box::new(ShortTranslator),
            sp_source: Box::new(WhitespaceModel),
            sp_target: Box::new(WhitespaceModel),
        };
        let err = translate("first.\nsecond.", Direction::EnJa, &bundle).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Translation(TranslationError::CountMismatch {
                expected: 2,
                returned: 1,
            })
        ));
    }

    #[test]
    fn tagger_failure_is_document_fatal_with_line_index() {
        let bundle = identity_bundle();
        let err = translate_with_bundle(
            "はい。\nこれ。",
            Direction::JaEn,
            &bundle,
            Some(&BrokenTagger),
            &TrueCaser::default(),
        )
        .unwrap_err();
        match err {
            TranslateError::Segmentation { line, .. } => assert_eq!(line, 0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_tagger_is_reported_as_unavailable() {
        let bundle = identity_bundle();
        let err = translate_with_bundle(
            "はい。",
            Direction::JaEn,
            &bundle,
            None,
            &TrueCaser::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Segmentation {
                line: 0,
                source: SegmentationError::TaggerUnavailable(_),
            }
        ));
    }

    /// Decodes the poison token to whitespace so detokenization fails for
    /// exactly that sentence.
    struct PoisonDecoder;

    impl SubwordModel for PoisonDecoder {
        fn encode(&self, text: &str) -> anyhow::Result<Vec<String>> {
            Ok(text.split_whitespace().map(str::to_string).collect())
        }

        fn decode(&self, tokens: &[String]) -> anyhow::Result<String> {
            if tokens == ["@poison@"] {
                Ok("   ".to_string())
            } else {
                Ok(tokens.join(" "))
            }
        }
    }

    #[test]
    fn postprocess_failure_degrades_one_sentence_only() {
        let bundle = ModelBundle {
            translator: Box::new(IdentityTranslator),
            sp_source: Box::new(WhitespaceModel),
            sp_target: Box::new(PoisonDecoder),
        };
        let out = translate("@poison@\ngood morning 。", Direction::JaEn, &bundle).unwrap();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 2);
        // Malformed sentence passes through undecorated; the rest translates.
        assert_eq!(lines[0], "   ");
        assert_eq!(lines[1], "Good morning 。");
    }

    /// Encodes a marker word to zero tokens.
    struct SkippingEncoder;

    impl SubwordModel for SkippingEncoder {
        fn encode(&self, text: &str) -> anyhow::Result<Vec<String>> {
            if text.contains("skipme") {
                return Ok(Vec::new());
            }
            Ok(text.split_whitespace().map(str::to_string).collect())
        }

        fn decode(&self, tokens: &[String]) -> anyhow::Result<String> {
            Ok(tokens.join(" "))
        }
    }

    #[test]
    fn zero_token_segment_maps_to_empty_output_in_place() {
        let bundle = ModelBundle {
            translator: Box::new(IdentityTranslator),
            sp_source: Box::new(SkippingEncoder),
            sp_target: Box::new(WhitespaceModel),
        };
        let out = translate("skipme.\nhello there.", Direction::EnJa, &bundle).unwrap();
        assert_eq!(out, "\nhello there.");
    }

    struct StubLoader;

    impl BundleLoader for StubLoader {
        fn load(&self, _direction: Direction) -> Result<ModelBundle, ModelLoadError> {
            Ok(identity_bundle())
        }
    }

    #[test]
    fn pipeline_front_door_translates_via_cached_bundle() {
        let pipeline = Pipeline::new(Box::new(StubLoader)).with_tagger(Box::new(EchoTagger));
        let out = pipeline.translate("Hello.\nBye.", Direction::EnJa).unwrap();
        assert_eq!(out, "hello.\nbye.");
        let out = pipeline.translate("はい。", Direction::JaEn).unwrap();
        assert_eq!(out, "はい。");
    }
}
