mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use relcheck_core::{UpdateResult, UpdateSession, UpdaterConfig};
use relcheck_platform::AppPaths;

#[derive(Parser)]
#[command(name = "relcheck")]
#[command(about = "Check a GitHub repository for a newer release", long_about = None)]
#[command(version)]
struct Cli {
    /// Log every step of the check
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the per-user settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the release API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether a newer release than CURRENT exists
    Check {
        /// Version currently running, for example 1.4.2
        current: String,
        /// Repository in owner/name form
        repository: String,
    },

    /// Check for a newer release and download its artifact
    Download {
        current: String,
        repository: String,
        /// Staging directory (defaults to the per-user update cache)
        #[arg(long)]
        dest: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = AppPaths::new().ok();
    if let Some(paths) = &paths {
        let _ = paths.ensure_dirs();
    }

    logging::init_logging(cli.verbose, paths.as_ref().map(AppPaths::log_file).as_deref());

    match run(&cli, paths.as_ref()) {
        Ok(result) if result.is_failure() => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("relcheck: {error}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli, paths: Option<&AppPaths>) -> Result<UpdaterConfig, String> {
    let settings = cli
        .config
        .clone()
        .or_else(|| paths.map(AppPaths::settings_file));
    let mut config = match settings {
        Some(path) => UpdaterConfig::load(&path).map_err(|error| error.to_string())?,
        None => UpdaterConfig::default(),
    };
    if let Some(api_base) = &cli.api_base {
        config.api_base.clone_from(api_base);
    }
    Ok(config)
}

fn run(cli: &Cli, paths: Option<&AppPaths>) -> Result<UpdateResult, String> {
    let config = load_config(cli, paths)?;

    match &cli.command {
        Commands::Check {
            current,
            repository,
        } => {
            let session = start_session(current, repository, cli.verbose, config)?;
            let result = session.result();
            print_check(&session, result);
            Ok(result)
        }
        Commands::Download {
            current,
            repository,
            dest,
        } => {
            let session = start_session(current, repository, cli.verbose, config)?;
            let result = session.result();
            print_check(&session, result);
            if !result.is_update_available() {
                return Ok(result);
            }

            let destination = dest
                .clone()
                .or_else(|| paths.map(AppPaths::update_dir))
                .ok_or("no staging directory available, pass --dest")?;
            let downloaded = session.download(&destination);
            println!("{downloaded} ({})", destination.display());
            Ok(downloaded)
        }
    }
}

fn start_session(
    current: &str,
    repository: &str,
    verbose: bool,
    config: UpdaterConfig,
) -> Result<UpdateSession, String> {
    let current = relcheck_core::Version::parse(current).map_err(|error| error.to_string())?;
    UpdateSession::start_with_config(current, repository, verbose, config)
        .map_err(|error| error.to_string())
}

fn print_check(session: &UpdateSession, result: UpdateResult) {
    println!("{}: {result}", session.repository());
    if result.is_update_available() {
        println!("latest: {}", session.latest_version());
        if let Some(changelog) = session.changelog().filter(|text| !text.trim().is_empty()) {
            println!("\n{changelog}");
        }
    }
}
