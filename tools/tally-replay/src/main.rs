use std::path::{Path, PathBuf};

use anchor_lang::prelude::Pubkey;
use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::Scenario;

#[derive(Parser, Debug)]
#[command(about = "Replay recorded election scenarios in parallel using rayon", author, version)]
struct Args {
    /// Directory containing scenario JSON files
    input_dir: PathBuf,
    /// Output directory for .tally.json reports
    output_dir: PathBuf,
    /// Authority recorded on every replayed election
    #[arg(long, default_value_t = Pubkey::default())]
    authority: Pubkey,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let written = run(&args.input_dir, &args.output_dir, args.authority)?;
    info!(scenarios = written.len(), "replay finished");
    Ok(())
}

/// Replays each `*.json` scenario in `input_dir` and writes its report next
/// to the others in `output_dir`. Returns the report paths, sorted.
fn run(input_dir: &Path, output_dir: &Path, authority: Pubkey) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let inputs: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .with_context(|| format!("reading {}", input_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
        .collect();

    let mut written = inputs
        .par_iter()
        .map(|input| -> anyhow::Result<PathBuf> {
            let name = input
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| anyhow::anyhow!("bad input name"))?;
            let raw = std::fs::read_to_string(input)?;
            let report = Scenario::from_json(&raw)
                .and_then(|s| s.replay(authority))
                .with_context(|| format!("scenario {name}"))?;
            info!(
                scenario = name,
                events = report.events.len(),
                rejections = report.rejections.len(),
                "replayed"
            );
            let out = output_dir.join(format!("{name}.tally.json"));
            std::fs::write(&out, serde_json::to_vec_pretty(&report)?)?;
            Ok(out)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    written.sort();
    Ok(written)
}
