//! Bidirectional English<->Japanese document translation pipeline.
//!
//! The core is [`pipeline::translate_with_bundle`]: a raw multi-line document
//! plus a [`Direction`] goes through direction-specific segmentation, subword
//! encoding, one batched sequence-to-sequence call, decoding, and
//! direction-specific postprocessing (script normalization for EN->JA,
//! detokenization plus true-casing for JA->EN), preserving the document's
//! line structure end to end.
//!
//! The inference engine, subword models, and morphological tagger are
//! collaborators behind the [`translator::BatchTranslator`],
//! [`subword::SubwordModel`], and [`segment::Tagger`] traits; native
//! CTranslate2/SentencePiece/Lindera adapters live in [`models`] behind
//! cargo features.

pub mod bundle;
pub mod config;
pub mod direction;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod postprocess;
pub mod progress;
pub mod provision;
pub mod segment;
pub mod subword;
pub mod translator;

pub use bundle::{BundleCache, BundleLoader, ModelBundle};
pub use direction::Direction;
pub use errors::TranslateError;
pub use pipeline::{translate_with_bundle, Pipeline};
