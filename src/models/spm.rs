use std::path::Path;

use sentencepiece::SentencePieceProcessor;

use crate::errors::ModelLoadError;
use crate::subword::SubwordModel;

/// Trained SentencePiece vocabulary model, the subword encode/decode pair for
/// one side of a direction.
pub struct SentencePieceSubword {
    spp: SentencePieceProcessor,
}

impl SentencePieceSubword {
    pub fn load(model_path: &Path) -> Result<Self, ModelLoadError> {
        let spp = SentencePieceProcessor::open(model_path).map_err(|e| {
            ModelLoadError::Corrupt {
                path: model_path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { spp })
    }
}

impl SubwordModel for SentencePieceSubword {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<String>> {
        let pieces = self.spp.encode(text)?;
        Ok(pieces.into_iter().map(|p| p.piece).collect())
    }

    fn decode(&self, tokens: &[String]) -> anyhow::Result<String> {
        Ok(self.spp.decode_pieces(tokens)?)
    }
}
