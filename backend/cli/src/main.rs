mod app;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use lectern_boot::CompositionRoot;
use lectern_config::{
    apply_all_defaults, config_dir, config_file_path, load_and_prepare, write_config, LecternConfig,
};
use lectern_logging::{init_console_logger, init_logger};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Lectern: bootstrap and mount the editor app")]
#[command(version)]
struct Cli {
    /// Config file (default: $LECTERN_CONFIG_DIR/config.yaml or ~/.lectern/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bootstrap and print the mounted markup
    Boot {
        /// Version manifest (overrides manifestPath)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Mount target selector (overrides mountTarget)
        #[arg(short, long)]
        target: Option<String>,
        /// Enable development diagnostics
        #[arg(short, long)]
        verbose: bool,
        /// Print a JSON summary instead of the markup
        #[arg(long)]
        json: bool,
    },
    /// Show what would be registered, in order, without booting
    Plan,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing config (the old one is kept as a backup)
        #[arg(long)]
        force: bool,
    },
    /// Print the application version
    Version {
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "lectern failed");
            output::note_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Init { force } => {
            init_console_logger("info");
            init_config(&config_path, force).await
        }
        Commands::Boot {
            manifest,
            target,
            verbose,
            json,
        } => {
            let mut config = prepare(&config_path).await?;
            if verbose {
                config.verbose_diagnostics = Some(true);
            }
            boot(&config, manifest, target, json).await
        }
        Commands::Plan => {
            let config = prepare(&config_path).await?;
            let version = app::load_version(Path::new(config.manifest_path())).await?;
            let manifest = app::build_manifest(&config, version, None)?;
            print!("{}", output::render_plan(&manifest.plan()));
            Ok(())
        }
        Commands::Version { manifest } => {
            let config = prepare(&config_path).await?;
            let path = manifest.unwrap_or_else(|| PathBuf::from(config.manifest_path()));
            println!("{}", app::load_version(&path).await?);
            Ok(())
        }
    }
}

/// Load the config and install the logger it describes.
async fn prepare(config_path: &Path) -> Result<LecternConfig> {
    let config = load_and_prepare(config_path).await?;
    match config.log_dir() {
        Some(dir) => init_logger(dir, config.log_level())?,
        None => init_console_logger(config.log_level()),
    };
    Ok(config)
}

async fn boot(
    config: &LecternConfig,
    manifest_path: Option<PathBuf>,
    target: Option<String>,
    json: bool,
) -> Result<()> {
    let manifest_path = manifest_path.unwrap_or_else(|| PathBuf::from(config.manifest_path()));
    let version = app::load_version(&manifest_path).await?;
    info!(version = %version, config_verbose = config.verbose_diagnostics(), "Booting");

    let manifest = app::build_manifest(config, version.clone(), target.as_deref())?;
    let mut root = CompositionRoot::new(manifest);
    root.bootstrap()?;

    let Some(app) = root.application() else {
        bail!("bootstrap finished without an application");
    };
    let Some(view) = app.mounted() else {
        bail!("bootstrap finished without a mounted view");
    };

    if json {
        let summary = json!({
            "appId": app.id().to_string(),
            "version": version.version(),
            "target": view.target.selector(),
            "mountedAt": view.mounted_at.to_rfc3339(),
            "state": root.state().to_string(),
            "plugins": root.runtime().installed_plugins(),
            "extensions": root.engine().extension_names(),
            "markup": &view.markup,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", view.markup);
    }
    output::note_success(&format!("Mounted {} at {}", version, view.target));
    Ok(())
}

async fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        output::note_warn(&format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        ));
        return Ok(());
    }
    write_config(&apply_all_defaults(LecternConfig::default()), path).await?;
    output::note_success(&format!("Wrote {}", path.display()));
    Ok(())
}
