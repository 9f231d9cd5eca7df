//! Artifact manifest utility for Glycoscope model directories.
//!
//! Writes `manifest.json` with the SHA-256 of every required artifact so the
//! server can detect corrupted or swapped files at startup.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_artifacts -- <model_dir>
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};

use glycoscope::adapters::artifacts::{ArtifactManifest, MANIFEST_FILE};

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let model_dir = match (args.next(), args.next()) {
        (Some(dir), None) => PathBuf::from(dir),
        _ => bail!("Usage: hash_artifacts <model_dir>"),
    };
    if !model_dir.is_dir() {
        bail!("{model_dir:?} is not a directory");
    }

    let manifest = ArtifactManifest::build(&model_dir, chrono::Utc::now().timestamp())
        .context("Failed to hash artifacts")?;

    let out_path = model_dir.join(MANIFEST_FILE);
    let mut json = serde_json::to_string_pretty(&manifest)?;
    json.push('\n');
    fs::write(&out_path, json).with_context(|| format!("Failed to write {out_path:?}"))?;

    for (name, digest) in &manifest.files {
        println!("{digest}  {name}");
    }
    println!("Wrote {}", out_path.display());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
