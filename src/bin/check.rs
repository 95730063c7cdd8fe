use anyhow::{Context, Result};
use clap::Parser;
use herbs::project::Project;
use herbs::report::metadata_report;
use std::path::PathBuf;

/// Offline metadata check: trait distribution plus every metadata file that
/// would fail verification. Exits 1 when any file fails.
#[derive(Parser, Debug)]
#[command(name = "herbs-check", version)]
struct Args {
    /// Project directory (the one holding `assets/`).
    project: PathBuf,

    /// Failing files to list.
    #[arg(long, default_value_t = 20)]
    max_examples: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let project = Project::open(&args.project)
        .with_context(|| format!("cannot open project {:?}", args.project))?;
    let report = metadata_report(&project.assets_dir())
        .with_context(|| format!("cannot read assets of {:?}", project.root()))?;

    println!("==============================");
    println!(" NFT Metadata Check: {}", project.name());
    println!(" Metadata files: {}", report.total);
    println!(" Valid: {}", report.valid());
    println!("==============================\n");

    let valid = report.valid().max(1) as f64;
    for trait_type in report.traits.keys() {
        println!("▶ Trait: {}", trait_type);
        for (value, count) in report.ranked_values(trait_type) {
            let ratio = count as f64 / valid * 100.0;
            println!("  {:30} {:5} ({:.2}%)", value, count, ratio);
        }
        println!();
    }

    if report.failures.is_empty() {
        println!("✅ Every metadata file is valid");
        return Ok(());
    }

    println!(
        "❌ {} invalid metadata file(s) (showing up to {}):",
        report.failures.len(),
        args.max_examples
    );
    for (path, reason) in report.failures.iter().take(args.max_examples) {
        let file = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("<unknown>");
        println!("  - {} : {}", file, reason);
    }
    std::process::exit(1);
}
