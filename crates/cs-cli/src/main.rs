use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use log::debug;

use cs_core::GenerateError;
use cs_core::config::{self, CONFIG_FILE_NAMES, Invocation};

#[derive(Parser)]
#[command(
    name = "create-schemas",
    about = "Generate TypeScript types from an OpenAPI 3.x document",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the types file and any plugin output
    Generate {
        /// Path, file: URL or http(s) URL of the OpenAPI document.
        /// Falls back to `input` in the config file.
        source: Option<String>,

        /// Output directory, relative to the working directory
        #[arg(short, long)]
        outdir: Option<PathBuf>,

        /// Working directory: where the config file is looked up and
        /// relative paths are resolved
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Initialize a create-schemas configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            source,
            outdir,
            cwd,
        } => cmd_generate(Invocation {
            source,
            outdir,
            cwd,
        }),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "create-schemas", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Prefix an error with the stage that produced it.
fn stage_error(err: GenerateError) -> anyhow::Error {
    anyhow::anyhow!("{} stage failed: {}", err.stage(), err)
}

fn cmd_generate(invocation: Invocation) -> Result<()> {
    let config = cs_runner::resolve(&invocation).map_err(stage_error)?;
    debug!("{config:?}");
    eprintln!("Generating {} → {}", config.source, config.outdir.display());

    let files = cs_runner::generate_with(&config).map_err(stage_error)?;
    let written = cs_runner::write_files(&config.outdir, &files)
        .map_err(|e| anyhow::anyhow!("write stage failed: {e}"))?;
    for path in &written {
        eprintln!("  wrote {}", path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        written.len(),
        config.outdir.display()
    );
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
