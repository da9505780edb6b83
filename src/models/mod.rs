//! Production model loading. The engine adapters are feature-gated: the
//! default build is engine-free and exercises the pipeline through the
//! collaborator traits, while `--features ctranslate2` links the native
//! CTranslate2/SentencePiece stack and `--features lindera` the wakati tagger.

#[cfg(feature = "ctranslate2")]
mod ct2;
#[cfg(feature = "ctranslate2")]
mod spm;
#[cfg(feature = "lindera")]
mod wakati;

#[cfg(feature = "ctranslate2")]
pub use ct2::Ct2Translator;
#[cfg(feature = "ctranslate2")]
pub use spm::SentencePieceSubword;
#[cfg(feature = "lindera")]
pub use wakati::LinderaTagger;

use std::path::PathBuf;

use crate::bundle::{BundleLoader, ModelBundle};
use crate::config::AppConfig;
use crate::direction::Direction;
use crate::errors::ModelLoadError;
use crate::segment::Tagger;

/// Loads per-direction bundles from the configured models directory.
/// File presence is validated up front so a missing or truncated asset
/// surfaces as `ModelLoadError` before any engine initialization.
pub struct FileBundleLoader {
    config: AppConfig,
    config_dir: PathBuf,
}

impl FileBundleLoader {
    pub fn new(config: AppConfig, config_dir: PathBuf) -> Self {
        Self { config, config_dir }
    }
}

impl BundleLoader for FileBundleLoader {
    fn load(&self, direction: Direction) -> Result<ModelBundle, ModelLoadError> {
        let resolved = self.config.resolve_models(&self.config_dir, direction);
        resolved.verify()?;
        build_bundle(direction, &resolved)
    }
}

#[cfg(feature = "ctranslate2")]
fn build_bundle(
    _direction: Direction,
    resolved: &crate::config::ResolvedModels,
) -> Result<ModelBundle, ModelLoadError> {
    Ok(ModelBundle {
        translator: Box::new(Ct2Translator::load(&resolved.translator_dir)?),
        sp_source: Box::new(SentencePieceSubword::load(&resolved.sp_source)?),
        sp_target: Box::new(SentencePieceSubword::load(&resolved.sp_target)?),
    })
}

#[cfg(not(feature = "ctranslate2"))]
fn build_bundle(
    direction: Direction,
    _resolved: &crate::config::ResolvedModels,
) -> Result<ModelBundle, ModelLoadError> {
    Err(ModelLoadError::EngineUnavailable(direction.to_string()))
}

/// Default wakati tagger for the JA->EN direction, when one is compiled in.
#[cfg(feature = "lindera")]
pub fn default_tagger() -> anyhow::Result<Option<Box<dyn Tagger>>> {
    Ok(Some(Box::new(LinderaTagger::new()?)))
}

#[cfg(not(feature = "lindera"))]
pub fn default_tagger() -> anyhow::Result<Option<Box<dyn Tagger>>> {
    Ok(None)
}
