//! `apel` – command line front end of the environment loader.
//!
//! ```text
//! apel load <manifest|bundle> [--mode generic|mesh|auto] [--atomic]
//! apel schema
//! apel init
//! ```
//!
//! `load` ingests a manifest into an in-process [`SimWorld`] and prints what
//! was created, which makes it a dry run for scenes headed to a real
//! simulator.  `schema` prints the JSON schema of the manifest format.
//! `init` writes the default configuration to `~/.apel/config.toml`.

mod config;

use std::process::ExitCode;

use apel_loader::{EnvironmentLoader, LoadMode};
use apel_types::ObjectRecord;
use apel_world::{Geometry, ObjectHandle, SimWorld};
use colored::Colorize;
use tracing::{error, info};

fn main() -> ExitCode {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the filter (default "info"); APEL_LOG_FORMAT=json
    // switches to newline-delimited JSON.  User-facing output stays on
    // stdout via println!.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("APEL_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            eprintln!();
            print_usage();
            return ExitCode::from(2);
        }
    };

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    let result = match command {
        Command::Load(args) => run_load(&cfg, &args),
        Command::Schema => print_schema(),
        Command::Init => run_init(&cfg),
        Command::Help => {
            print_usage();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "apel failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Command {
    Load(LoadArgs),
    Schema,
    Init,
    Help,
}

#[derive(Debug, PartialEq)]
struct LoadArgs {
    manifest: String,
    mode: Option<LoadMode>,
    atomic: bool,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some((cmd, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };
    match cmd.as_str() {
        "load" => parse_load_args(rest).map(Command::Load),
        "schema" => Ok(Command::Schema),
        "init" => Ok(Command::Init),
        "help" | "-h" | "--help" => Ok(Command::Help),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn parse_load_args(args: &[String]) -> Result<LoadArgs, String> {
    let mut manifest = None;
    let mut mode = None;
    let mut atomic = false;

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--atomic" => atomic = true,
            "--mode" => {
                let value = it.next().ok_or("--mode needs a value")?;
                mode = Some(value.parse::<LoadMode>()?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{flag}'")),
            path if manifest.is_none() => manifest = Some(path.to_string()),
            extra => return Err(format!("unexpected argument '{extra}'")),
        }
    }

    Ok(LoadArgs {
        manifest: manifest.ok_or("load needs a manifest path or bundle name")?,
        mode,
        atomic,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn run_load(cfg: &config::Config, args: &LoadArgs) -> Result<(), String> {
    let manifest = cfg.resolve_manifest(&args.manifest);
    let mode = args.mode.unwrap_or(cfg.load_mode);
    let atomic = args.atomic || cfg.atomic;

    let mut world = SimWorld::builder()
        .with_resources_path(&cfg.resources_path)
        .build();
    info!(
        manifest = %manifest.display(),
        resources = %cfg.resources_path.display(),
        %mode,
        atomic,
        "loading environment"
    );

    let mut loader = EnvironmentLoader::new(&manifest, &mut world).map_err(|e| e.to_string())?;
    let loaded = if atomic {
        loader.load_all_atomic(mode)
    } else {
        loader.load_all_with(mode)
    };

    match loaded {
        Ok(objects) => {
            println!(
                "\n  {} {} object(s) from {}\n",
                "✓".green().bold(),
                objects.len(),
                manifest.display().to_string().bold()
            );
            for handle in objects {
                println!("    {}", describe(handle));
            }
            println!();
            Ok(())
        }
        Err(e) => {
            let kept = loader.objects().len();
            if kept > 0 {
                println!(
                    "  {} {} object(s) were created before the failure",
                    "!".yellow().bold(),
                    kept
                );
            }
            Err(e.to_string())
        }
    }
}

fn print_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(Vec<ObjectRecord>);
    let json = serde_json::to_string_pretty(&schema)
        .map_err(|e| format!("Failed to serialize schema: {}", e))?;
    println!("{json}");
    Ok(())
}

fn run_init(cfg: &config::Config) -> Result<(), String> {
    let path = config::config_path();
    if path.exists() {
        println!("  Config already present at {}", path.display().to_string().bold());
        return Ok(());
    }
    config::save(cfg)?;
    println!(
        "  {} Config saved to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// One-line summary of a created object.
fn describe(handle: &ObjectHandle) -> String {
    let p = handle.pose().position;
    let q = handle.pose().orientation;
    let shape = match handle.geometry() {
        Geometry::Box { half_extents: e } => format!("box [{:.3}, {:.3}, {:.3}]", e.x, e.y, e.z),
        Geometry::Mesh { path } => {
            let file = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            format!("mesh {file}")
        }
    };
    let mut line = format!(
        "{:<20} {}  at [{:.3}, {:.3}, {:.3}]  q [{:.3}, {:.3}, {:.3}, {:.3}]",
        handle.name().bold(),
        shape,
        p.x,
        p.y,
        p.z,
        q.x,
        q.y,
        q.z,
        q.w
    );
    if let Some(scale) = handle.scale() {
        line.push_str(&format!("  scale {scale}"));
    }
    line
}

fn print_usage() {
    println!("{} {}", "apel".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Annotated perceived environment loader");
    println!();
    println!("  {}", "USAGE".bold());
    println!("    apel load <manifest|bundle> [--mode generic|mesh|auto] [--atomic]");
    println!("    apel schema");
    println!("    apel init");
    println!();
    println!("  Config: {}", config::config_path().display());
}
