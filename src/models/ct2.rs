use std::path::Path;

use ct2rs::{Config, TranslationOptions, Translator};

use crate::errors::ModelLoadError;
use crate::translator::BatchTranslator;

/// Identity tokenizer handed to CTranslate2: the pipeline owns subword
/// encoding, so tokens cross this boundary as space-joined strings.
struct SpacedTokens;

impl ct2rs::Tokenizer for SpacedTokens {
    fn encode(&self, input: &str) -> anyhow::Result<Vec<String>> {
        Ok(input.split(' ').map(str::to_string).collect())
    }

    fn decode(&self, tokens: Vec<String>) -> anyhow::Result<String> {
        Ok(tokens.join(" "))
    }
}

/// CTranslate2-backed batch translator for one direction's model directory.
/// CTranslate2 batch translation is safe for concurrent callers; the bundle
/// is shared read-only across translate calls.
pub struct Ct2Translator {
    inner: Translator<SpacedTokens>,
}

impl Ct2Translator {
    pub fn load(model_dir: &Path) -> Result<Self, ModelLoadError> {
        let inner = Translator::with_tokenizer(model_dir, SpacedTokens, &Config::default())
            .map_err(|e| ModelLoadError::Engine(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl BatchTranslator for Ct2Translator {
    fn translate_batch(&self, batch: &[Vec<String>]) -> anyhow::Result<Vec<Vec<String>>> {
        let sources: Vec<String> = batch.iter().map(|tokens| tokens.join(" ")).collect();
        let results =
            self.inner
                .translate_batch(&sources, &TranslationOptions::default(), None)?;
        Ok(results
            .into_iter()
            .map(|(best, _score)| best.split(' ').map(str::to_string).collect())
            .collect())
    }
}
