use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::direction::Direction;
use crate::errors::ModelLoadError;

pub const CONFIG_FILENAME: &str = "jp-translate.toml";
pub const CONFIG_ENV: &str = "JP_TRANSLATE_CONFIG";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub models: ModelsSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ModelsSection {
    /// Directory holding provisioned model assets. Relative paths resolve
    /// against the config file directory. Default: `models`.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Remote-storage root the asset fetcher reads archives from (a mounted
    /// bucket or share).
    #[serde(default)]
    pub asset_source: Option<PathBuf>,

    /// Asset manifest file name inside `asset_source`.
    #[serde(default)]
    pub manifest: Option<String>,

    /// Truecase lexicon (TSV) inside the models dir; optional, the caser
    /// falls back to rule-only behavior without it.
    #[serde(default)]
    pub truecase_model: Option<String>,

    #[serde(default, rename = "en-ja")]
    pub en_ja: DirectionModels,
    #[serde(default, rename = "ja-en")]
    pub ja_en: DirectionModels,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct DirectionModels {
    /// Translation model directory name inside the models dir.
    #[serde(default)]
    pub translator_dir: Option<String>,
    /// Source/target subword model file names inside the models dir.
    #[serde(default)]
    pub sp_source: Option<String>,
    #[serde(default)]
    pub sp_target: Option<String>,
}

/// Concrete on-disk layout of one direction's models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedModels {
    pub translator_dir: PathBuf,
    pub sp_source: PathBuf,
    pub sp_target: PathBuf,
}

impl ResolvedModels {
    /// Presence/shape validation ahead of an engine load, so missing assets
    /// surface as `ModelLoadError` before any translation is attempted.
    pub fn verify(&self) -> Result<(), ModelLoadError> {
        if !self.translator_dir.is_dir() {
            return Err(ModelLoadError::MissingFile(self.translator_dir.clone()));
        }
        for path in [&self.sp_source, &self.sp_target] {
            if !path.is_file() {
                return Err(ModelLoadError::MissingFile(path.clone()));
            }
            let len = path
                .metadata()
                .map(|m| m.len())
                .map_err(|e| ModelLoadError::Corrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            if len == 0 {
                return Err(ModelLoadError::Corrupt {
                    path: path.clone(),
                    reason: "empty file".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
        Ok(cfg)
    }

    pub fn models_dir(&self, config_dir: &Path) -> PathBuf {
        let dir = self
            .models
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("models"));
        if dir.is_relative() {
            config_dir.join(dir)
        } else {
            dir
        }
    }

    pub fn truecase_model_path(&self, config_dir: &Path) -> Option<PathBuf> {
        self.models
            .truecase_model
            .as_ref()
            .map(|name| self.models_dir(config_dir).join(name))
    }

    /// Resolve one direction's model files, falling back to the conventional
    /// asset names when the config leaves them unset.
    pub fn resolve_models(&self, config_dir: &Path, direction: Direction) -> ResolvedModels {
        let models_dir = self.models_dir(config_dir);
        let section = match direction {
            Direction::EnJa => &self.models.en_ja,
            Direction::JaEn => &self.models.ja_en,
        };
        let (sp_source_default, sp_target_default) = direction.subword_ids();
        ResolvedModels {
            translator_dir: models_dir.join(
                section
                    .translator_dir
                    .as_deref()
                    .unwrap_or_else(|| direction.translator_id()),
            ),
            sp_source: models_dir.join(section.sp_source.as_deref().unwrap_or(sp_source_default)),
            sp_target: models_dir.join(section.sp_target.as_deref().unwrap_or(sp_target_default)),
        }
    }
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

/// Locate the config file: explicit env var first, then upwards from the
/// current directory, then upwards from the executable's directory.
pub fn find_default_config() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(CONFIG_ENV) {
        let p = PathBuf::from(p);
        if p.exists() {
            return Some(p);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, CONFIG_FILENAME, 8) {
            return Some(p);
        }
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, CONFIG_FILENAME, 8) {
                return Some(p);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_conventional_asset_names() {
        let cfg = AppConfig::default();
        let resolved = cfg.resolve_models(Path::new("/app"), Direction::EnJa);
        assert_eq!(
            resolved.translator_dir,
            Path::new("/app/models/ENJP_ctranslate2")
        );
        assert_eq!(resolved.sp_source, Path::new("/app/models/EN_Final.model"));
        assert_eq!(resolved.sp_target, Path::new("/app/models/JP_Final.model"));

        let resolved = cfg.resolve_models(Path::new("/app"), Direction::JaEn);
        assert_eq!(resolved.sp_source, Path::new("/app/models/JP_Final.model"));
    }

    #[test]
    fn overrides_parse_from_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [models]
            dir = "/srv/mt"
            truecase_model = "en_truecase.tsv"

            [models.ja-en]
            translator_dir = "jpen_v2"
            sp_source = "jp_v2.model"
            "#,
        )
        .unwrap();
        let resolved = cfg.resolve_models(Path::new("/ignored"), Direction::JaEn);
        assert_eq!(resolved.translator_dir, Path::new("/srv/mt/jpen_v2"));
        assert_eq!(resolved.sp_source, Path::new("/srv/mt/jp_v2.model"));
        assert_eq!(resolved.sp_target, Path::new("/srv/mt/EN_Final.model"));
        assert_eq!(
            cfg.truecase_model_path(Path::new("/ignored")).unwrap(),
            Path::new("/srv/mt/en_truecase.tsv")
        );
    }

    #[test]
    fn verify_reports_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = ResolvedModels {
            translator_dir: dir.path().join("ENJP_ctranslate2"),
            sp_source: dir.path().join("EN_Final.model"),
            sp_target: dir.path().join("JP_Final.model"),
        };
        assert!(matches!(
            resolved.verify(),
            Err(ModelLoadError::MissingFile(_))
        ));

        std::fs::create_dir(&resolved.translator_dir).unwrap();
        std::fs::write(&resolved.sp_source, b"spm").unwrap();
        std::fs::write(&resolved.sp_target, b"").unwrap();
        assert!(matches!(
            resolved.verify(),
            Err(ModelLoadError::Corrupt { .. })
        ));

        std::fs::write(&resolved.sp_target, b"spm").unwrap();
        resolved.verify().unwrap();
    }
}
