use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use zip::ZipArchive;

/// Remote storage collaborator: materializes one named archive at `dest`.
/// The transport (HTTP, object store, mounted share) is the caller's choice.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, archive: &str, dest: &Path) -> anyhow::Result<()>;
}

/// Fetcher over a local or mounted directory of model archives.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetFetcher for DirFetcher {
    fn fetch(&self, archive: &str, dest: &Path) -> anyhow::Result<()> {
        let src = self.root.join(archive);
        fs::copy(&src, dest)
            .with_context(|| format!("fetch asset: {}", src.display()))?;
        Ok(())
    }
}

/// One provisionable model asset: target directory name, archive name in
/// remote storage, optional integrity digest.
#[derive(Clone, Debug, Deserialize)]
pub struct AssetSpec {
    pub name: String,
    pub archive: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AssetManifest {
    #[serde(default)]
    pub assets: Vec<AssetSpec>,
}

pub fn load_manifest(path: &Path) -> anyhow::Result<AssetManifest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read asset manifest: {}", path.display()))?;
    let manifest: AssetManifest = serde_json::from_str(&text).context("parse asset manifest")?;
    Ok(manifest)
}

/// Provision one model asset under `models_dir`. Idempotent: an already
/// materialized directory is a no-op. Never leaves partial state behind: all
/// work happens in a staging directory that is renamed into place only after
/// fetch, verification, and extraction have all succeeded.
pub fn provision(
    models_dir: &Path,
    spec: &AssetSpec,
    fetcher: &dyn AssetFetcher,
) -> anyhow::Result<PathBuf> {
    let dest = models_dir.join(&spec.name);
    if dest.exists() {
        log::info!("asset {} already provisioned", spec.name);
        return Ok(dest);
    }
    fs::create_dir_all(models_dir)
        .with_context(|| format!("create models dir: {}", models_dir.display()))?;

    let staging = models_dir.join(format!(".staging-{}", spec.name));
    if staging.exists() {
        // Stale leftovers from an interrupted run.
        fs::remove_dir_all(&staging).context("clear stale staging dir")?;
    }
    fs::create_dir_all(&staging).context("create staging dir")?;

    let result = provision_into_staging(&staging, &dest, spec, fetcher);
    if result.is_err() {
        let _ = fs::remove_dir_all(&staging);
    }
    result
}

fn provision_into_staging(
    staging: &Path,
    dest: &Path,
    spec: &AssetSpec,
    fetcher: &dyn AssetFetcher,
) -> anyhow::Result<PathBuf> {
    let archive_path = staging.join(&spec.archive);
    fetcher
        .fetch(&spec.archive, &archive_path)
        .with_context(|| format!("fetch {}", spec.archive))?;

    if let Some(expected) = spec.sha256.as_deref() {
        let actual = sha256_file(&archive_path)?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(anyhow!(
                "digest mismatch for {}: expected {expected}, got {actual}",
                spec.archive
            ));
        }
    }

    let unpacked = staging.join("unpacked");
    fs::create_dir_all(&unpacked).context("create unpack dir")?;
    extract_zip(&archive_path, &unpacked)?;

    fs::rename(&unpacked, dest)
        .with_context(|| format!("activate asset: {}", dest.display()))?;
    let _ = fs::remove_dir_all(staging);
    log::info!("provisioned asset {} -> {}", spec.name, dest.display());
    Ok(dest.to_path_buf())
}

fn sha256_file(path: &Path) -> anyhow::Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("open for digest: {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).context("hash archive")?;
    Ok(hex::encode(hasher.finalize()))
}

fn extract_zip(archive_path: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let f = File::open(archive_path)
        .with_context(|| format!("open archive: {}", archive_path.display()))?;
    let mut zip = ZipArchive::new(f).context("read zip")?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("zip entry")?;
        let Some(rel) = entry.enclosed_name() else {
            return Err(anyhow!("unsafe path in archive: {}", entry.name()));
        };
        let out_path = out_dir.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("create dir: {}", out_path.display()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("create file: {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("extract: {}", out_path.display()))?;
    }
    Ok(())
}
