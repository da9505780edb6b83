use crate::errors::EncodingError;
use crate::segment::Segment;

/// Trained subword vocabulary model, treated as a pure encode/decode pair.
/// Token sequences are ordered subword strings, one-to-one with a segment.
pub trait SubwordModel: Send + Sync {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<String>>;
    fn decode(&self, tokens: &[String]) -> anyhow::Result<String>;
}

/// One encoded batch slot. `Empty` marks a degenerate segment that produced
/// zero tokens; it is withheld from the translator (whose batch contract does
/// not cover empty inputs) and mapped to an empty translation at its position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Encoded {
    Tokens(Vec<String>),
    Empty,
}

/// Order-preserving batch encode: the i-th output corresponds exactly to the
/// i-th input segment. Zero-token segments are recovered as `Encoded::Empty`
/// (per-segment `EncodingError`, never surfaced); engine failures bubble up.
pub fn encode_segments(
    model: &dyn SubwordModel,
    segments: &[Segment],
) -> anyhow::Result<Vec<Encoded>> {
    let mut encoded = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let tokens = model.encode(&segment.text)?;
        if tokens.is_empty() {
            let err = EncodingError { index };
            log::warn!("{err}; substituting empty translation");
            encoded.push(Encoded::Empty);
        } else {
            encoded.push(Encoded::Tokens(tokens));
        }
    }
    Ok(encoded)
}

/// Order-preserving batch decode of translated token sequences.
pub fn decode_batch(
    model: &dyn SubwordModel,
    token_sequences: &[Vec<String>],
) -> anyhow::Result<Vec<String>> {
    token_sequences
        .iter()
        .map(|tokens| model.decode(tokens))
        .collect()
}
