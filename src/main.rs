use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use jp_translate::config::{find_default_config, AppConfig};
use jp_translate::models::{self, FileBundleLoader};
use jp_translate::postprocess::TrueCaser;
use jp_translate::progress::ConsoleProgress;
use jp_translate::provision::{load_manifest, provision, DirFetcher};
use jp_translate::{Direction, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "jp-translate")]
#[command(about = "EN<->JA document translator (CTranslate2 + SentencePiece)", long_about = None)]
struct Args {
    /// Source document (default: stdin). UTF-8 or Shift_JIS.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Translation direction: en-ja or ja-en
    #[arg(short, long)]
    direction: Option<Direction>,

    /// Config file path (default: search for jp-translate.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Provision model assets from the configured asset source, then
    /// continue (or exit, if there is nothing to translate)
    #[arg(long)]
    provision: bool,

    /// Verify that both directions' model files are present, then exit
    #[arg(long)]
    check: bool,

    /// Suppress progress output on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let progress = ConsoleProgress::new(!args.quiet);

    let config_path = args.config.clone().or_else(find_default_config);
    let (config, config_dir) = match &config_path {
        Some(path) => {
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (AppConfig::load(path)?, dir)
        }
        None => (
            AppConfig::default(),
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        ),
    };

    if args.provision {
        provision_assets(&config, &config_dir, &progress)?;
        if args.input.is_none() && args.direction.is_none() {
            return Ok(());
        }
    }

    if args.check {
        let mut ok = true;
        for direction in Direction::ALL {
            let resolved = config.resolve_models(&config_dir, direction);
            match resolved.verify() {
                Ok(()) => progress.info(format!("{direction}: model files present")),
                Err(err) => {
                    ok = false;
                    progress.warn(format!("{direction}: {err}"));
                }
            }
        }
        if !ok {
            return Err(anyhow::anyhow!(
                "model files missing; run with --provision first"
            ));
        }
        return Ok(());
    }

    let direction = args
        .direction
        .context("missing -d/--direction (en-ja or ja-en)")?;
    let document = read_document(args.input.as_deref())?;
    let chars = document.chars().count();
    if chars > Pipeline::RECOMMENDED_MAX_CHARS {
        progress.warn(format!(
            "input is {chars} characters (recommended bound {}); the whole document is sent to the translator as one batch",
            Pipeline::RECOMMENDED_MAX_CHARS
        ));
    }

    let mut pipeline = Pipeline::new(Box::new(FileBundleLoader::new(
        config.clone(),
        config_dir.clone(),
    )));
    if let Some(tagger) = models::default_tagger()? {
        pipeline = pipeline.with_tagger(tagger);
    }
    if let Some(tc_path) = config.truecase_model_path(&config_dir) {
        if tc_path.is_file() {
            pipeline = pipeline.with_truecaser(TrueCaser::from_tsv_path(&tc_path)?);
        }
    }

    progress.info(format!("translating {} ({chars} chars)", direction.label()));
    let translation = pipeline.translate(&document, direction)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &translation)
                .with_context(|| format!("write output: {}", path.display()))?;
            progress.info(format!("wrote {}", path.display()));
        }
        None => {
            print!("{translation}");
            if !translation.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn provision_assets(
    config: &AppConfig,
    config_dir: &Path,
    progress: &ConsoleProgress,
) -> anyhow::Result<()> {
    let source = config
        .models
        .asset_source
        .clone()
        .context("--provision requires models.asset_source in the config")?;
    let manifest_name = config.models.manifest.as_deref().unwrap_or("manifest.json");
    let manifest = load_manifest(&source.join(manifest_name))?;
    let fetcher = DirFetcher::new(&source);
    let models_dir = config.models_dir(config_dir);
    for asset in &manifest.assets {
        progress.info(format!("provisioning {}", asset.name));
        provision(&models_dir, asset, &fetcher)?;
    }
    progress.info(format!("{} assets ready", manifest.assets.len()));
    Ok(())
}

fn read_document(path: Option<&Path>) -> anyhow::Result<String> {
    let bytes = match path {
        Some(p) => fs::read(p).with_context(|| format!("read input: {}", p.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("read stdin")?;
            buf
        }
    };
    Ok(decode_document(&bytes))
}

/// Japanese source files are frequently Shift_JIS; accept both that and
/// UTF-8 (with or without a BOM) rather than erroring on the first byte.
fn decode_document(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.trim_start_matches('\u{feff}').to_string();
    }
    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    String::from_utf8_lossy(bytes).into_owned()
}
