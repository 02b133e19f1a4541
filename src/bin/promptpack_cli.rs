//! PromptPack CLI - Generate and validate prompt packages
//!
//! Commands: generate, validate
//! Exit codes: 0 success, 2 validation failure, 1 internal error

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use promptpack_core::{
    discover_packages, ensure_unique_product_ids, generate_package, read_product_sheet, safe_id,
    validate_package, Error,
};

#[derive(Parser)]
#[command(name = "promptpack-cli")]
#[command(about = "PromptPack CLI - Product Sheet to Prompt Package Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate per-product prompt/text packages
    Generate {
        /// CSV file (utf-8) with product rows
        #[arg(long)]
        input: PathBuf,

        /// Output root folder
        #[arg(long)]
        out: PathBuf,

        /// Optional batch id appended to expected image filenames (e.g. 2025-12-26A)
        #[arg(long)]
        batch_id: Option<String>,
    },

    /// Validate generated packages
    Validate {
        /// Output root folder
        #[arg(long)]
        out: PathBuf,

        /// Validate a single product id
        #[arg(long)]
        product_id: Option<String>,

        /// Also require expected .png images to exist
        #[arg(long)]
        require_images: bool,
    },
}

fn cmd_generate(input: &Path, out: &Path, batch_id: Option<&str>) -> promptpack_core::Result<()> {
    let products = read_product_sheet(input)?;

    if out.exists() && !out.is_dir() {
        return Err(Error::validation(format!(
            "Output root must be a directory: {}",
            out.display()
        )));
    }
    std::fs::create_dir_all(out)?;

    ensure_unique_product_ids(&products)?;

    let mut created = Vec::new();
    for product in &products {
        created.push(generate_package(product, out, batch_id)?);
    }

    println!(
        "Generated {} product package(s) in {}",
        created.len(),
        out.display()
    );
    Ok(())
}

fn cmd_validate(
    out: &Path,
    product_id: Option<&str>,
    require_images: bool,
) -> promptpack_core::Result<()> {
    if !out.exists() {
        return Err(Error::validation(format!(
            "Output root not found: {}",
            out.display()
        )));
    }
    if !out.is_dir() {
        return Err(Error::validation(format!(
            "Output root must be a directory: {}",
            out.display()
        )));
    }

    if let Some(raw) = product_id {
        let raw = raw.trim();
        let sid = safe_id(raw);
        if sid.is_empty() || sid != raw {
            return Err(Error::validation(
                "product_id contains unsafe characters; allowed: letters, numbers, '-' and '_'",
            ));
        }
        let product_dir = out.join(&sid);
        validate_package(&product_dir, require_images)?;
        println!("OK: {}", product_dir.display());
        return Ok(());
    }

    // Validate every product folder that has a manifest.
    let packages = discover_packages(out)?;
    for dir in &packages {
        validate_package(dir, require_images)?;
    }
    println!(
        "OK: validated {} product package(s) under {}",
        packages.len(),
        out.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            input,
            out,
            batch_id,
        } => cmd_generate(&input, &out, batch_id.as_deref()),
        Commands::Validate {
            out,
            product_id,
            require_images,
        } => cmd_validate(&out, product_id.as_deref(), require_images),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_validation() => {
            eprintln!("ERROR: {}", e);
            ExitCode::from(2) // Validation failure
        }
        Err(e) => {
            if std::env::var("PROMPTPACK_DEBUG").map_or(false, |v| v == "1") {
                eprintln!("FATAL: {:?}", e);
            } else {
                eprintln!("FATAL: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
