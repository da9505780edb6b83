use lindera::dictionary::{load_dictionary_from_kind, DictionaryKind};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use lindera::tokenizer::Tokenizer;

use crate::errors::SegmentationError;
use crate::segment::Tagger;

/// Morphological word segmenter over the bundled IPADIC dictionary. Produces
/// wakati output: surface forms joined by single spaces.
pub struct LinderaTagger {
    tokenizer: Tokenizer,
}

impl LinderaTagger {
    pub fn new() -> anyhow::Result<Self> {
        let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC)?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        Ok(Self {
            tokenizer: Tokenizer::new(segmenter),
        })
    }
}

impl Tagger for LinderaTagger {
    fn wakati(&self, unit: &str) -> Result<String, SegmentationError> {
        let mut tokens =
            self.tokenizer
                .tokenize(unit)
                .map_err(|e| SegmentationError::TaggerFailed {
                    unit: unit.to_string(),
                    message: e.to_string(),
                })?;
        let words: Vec<String> = tokens.iter_mut().map(|t| t.text.to_string()).collect();
        Ok(words.join(" "))
    }
}
