//! relpack - release archive packager
//!
//! Packages a project's release files into a single ZIP archive, or leaves
//! nothing behind when any of them is missing.

use clap::{Args, Parser, Subcommand};
use rp_bundle::{ArchiveReader, JsonlWriter, ProgressEmitter};
use rp_config::CleanupPolicy;
use rp_core::exit_codes::ExitCode;
use rp_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use rp_core::release::{load_release, resolve_base_dir, CliError, Release, ReleaseOverrides};
use rp_core::{ConsoleEmitter, OutputFormat};
use std::path::PathBuf;
use std::sync::Arc;

/// Package release files into a single archive
#[derive(Parser)]
#[command(name = "relpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Project directory that manifest items resolve against (default: current directory)
    #[arg(long, short = 'C', global = true, env = "RELPACK_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Path to release config (default: RELPACK_CONFIG or <base-dir>/release.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "human")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the release archive (default)
    Build(BuildArgs),

    /// Check an archive against the manifest and its source files
    Verify(VerifyArgs),

    /// Show the resolved manifest and output location
    Manifest(ManifestArgs),

    /// Print version information
    Version,
}

/// Overrides for values normally read from release.json
#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Manifest item (repeatable; replaces the configured manifest)
    #[arg(long = "item", value_name = "NAME")]
    items: Vec<String>,

    /// Output directory (relative to the base directory unless absolute)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Archive file name inside the output directory
    #[arg(long)]
    archive_name: Option<String>,

    /// What to remove on failure: remove-output-dir or created-only
    #[arg(long)]
    cleanup: Option<CleanupPolicy>,
}

impl From<&OverrideArgs> for ReleaseOverrides {
    fn from(args: &OverrideArgs) -> Self {
        ReleaseOverrides {
            items: args.items.clone(),
            out_dir: args.out_dir.clone(),
            archive_name: args.archive_name.clone(),
            cleanup: args.cleanup,
        }
    }
}

#[derive(Args, Debug, Default)]
struct BuildArgs {
    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Archive to verify (default: the configured output archive)
    archive: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args, Debug)]
struct ManifestArgs {
    #[command(flatten)]
    overrides: OverrideArgs,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    let cli_format = cli.global.format.is_json().then_some(LogFormat::Jsonl);
    init_logging(&LogConfig::from_env(cli_level, cli_format));

    let exit_code = match &cli.command {
        None => run_build(&cli.global, &BuildArgs::default()),
        Some(Commands::Build(args)) => run_build(&cli.global, args),
        Some(Commands::Verify(args)) => run_verify(&cli.global, args),
        Some(Commands::Manifest(args)) => run_manifest(&cli.global, args),
        Some(Commands::Version) => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn resolve(global: &GlobalOpts, overrides: &OverrideArgs) -> Result<Release, CliError> {
    let base_dir = resolve_base_dir(global.base_dir.as_deref())?;
    load_release(global.config.as_deref(), base_dir, &overrides.into())
}

/// Report a command failure and map it to an exit code.
fn fail(global: &GlobalOpts, err: &CliError) -> ExitCode {
    let code = err.exit_code();
    tracing::error!(error = %err, code = code.code_name(), "Command failed");
    if global.format.is_json() {
        let payload = serde_json::json!({
            "error": code.code_name(),
            "exit_code": code.as_i32(),
            "config_code": err.config_code(),
            "message": err.to_string(),
        });
        println!("{}", payload);
    } else {
        eprintln!("relpack: {}", err);
    }
    code
}

fn run_build(global: &GlobalOpts, args: &BuildArgs) -> ExitCode {
    let release = match resolve(global, &args.overrides) {
        Ok(release) => release,
        Err(err) => return fail(global, &err),
    };
    let packager = match release.packager() {
        Ok(packager) => packager,
        Err(err) => return fail(global, &err),
    };

    let emitter: Arc<dyn ProgressEmitter> = match global.format {
        OutputFormat::Human => Arc::new(ConsoleEmitter::stdout()),
        OutputFormat::Json => Arc::new(JsonlWriter::new(std::io::stderr())),
    };
    let run_id = generate_run_id();
    tracing::debug!(
        run_id = %run_id,
        base_dir = %release.base_dir.display(),
        config_source = %release.resolved.source,
        "Starting build"
    );

    match packager.with_emitter(emitter).with_run_id(run_id).package() {
        Ok(report) => {
            if global.format.is_json() {
                match report.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(err) => return fail(global, &err.into()),
                }
            }
            ExitCode::Clean
        }
        Err(err) => {
            let code = ExitCode::from(&err);
            tracing::error!(error = %err, code = code.code_name(), "Release aborted");
            if global.format.is_json() {
                let payload = serde_json::json!({
                    "error": code.code_name(),
                    "exit_code": code.as_i32(),
                    "message": err.to_string(),
                    "missing_item": err.missing_item(),
                });
                println!("{}", payload);
            }
            code
        }
    }
}

fn run_verify(global: &GlobalOpts, args: &VerifyArgs) -> ExitCode {
    let release = match resolve(global, &args.overrides) {
        Ok(release) => release,
        Err(err) => return fail(global, &err),
    };
    let packager = match release.packager() {
        Ok(packager) => packager,
        Err(err) => return fail(global, &err),
    };
    let archive_path = args
        .archive
        .clone()
        .unwrap_or_else(|| release.archive_path());

    let verified = ArchiveReader::open(&archive_path)
        .and_then(|mut reader| reader.verify_against(packager.manifest(), &release.base_dir));

    match verified {
        Ok(entries) => {
            if global.format.is_json() {
                let payload = serde_json::json!({
                    "archive_path": archive_path,
                    "verified": true,
                    "entries": entries,
                });
                println!("{}", payload);
            } else {
                println!(
                    "[verified: {} entries in {}]",
                    entries.len(),
                    archive_path.display()
                );
            }
            ExitCode::Clean
        }
        Err(err) => fail(global, &err.into()),
    }
}

fn run_manifest(global: &GlobalOpts, args: &ManifestArgs) -> ExitCode {
    let release = match resolve(global, &args.overrides) {
        Ok(release) => release,
        Err(err) => return fail(global, &err),
    };
    let summary = release.summary();

    if global.format.is_json() {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(err) => return fail(global, &rp_bundle::PackageError::from(err).into()),
        }
    } else {
        println!("base dir: {}", summary.base_dir.display());
        match &summary.config_path {
            Some(path) => println!("config:   {} ({})", path.display(), summary.config_source),
            None => println!("config:   {}", summary.config_source),
        }
        println!("archive:  {}", summary.archive_path.display());
        println!("cleanup:  {}", summary.cleanup);
        println!("items:");
        for item in &summary.items {
            println!("  {}", item);
        }
    }
    ExitCode::Clean
}

fn print_version(global: &GlobalOpts) {
    let version = env!("CARGO_PKG_VERSION");
    if global.format.is_json() {
        println!("{}", serde_json::json!({ "name": "relpack", "version": version }));
    } else {
        println!("relpack {}", version);
    }
}
