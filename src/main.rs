use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nametrace::config::Config;
use nametrace::engine::Engine;
use nametrace::service::ServiceKey;
use nametrace::session::{Report, Update};
use nametrace::suggest::Suggestions;

/// Longest details text printed per service.
const MAX_DETAILS: usize = 140;

#[derive(Parser)]
#[command(
    name = "nametrace",
    version,
    about = "Check whether a project name is already taken across package registries and GitHub",
    after_help = "Risk is assessed from crates.io and GitHub only, so both must be \
                  enabled for a verdict. Homebrew results are approximated from GitHub \
                  repository names and are best-effort.\n\n\
                  Exit status is 0 when no collision was found, 1 when the risk is \
                  above low or any service reports the name as taken, and 2 on usage \
                  or configuration errors."
)]
struct Cli {
    /// Project name to check
    name: Option<String>,

    /// Only query these services (repeatable)
    #[arg(short, long = "service", value_enum)]
    services: Vec<ServiceKey>,

    /// Print every service key and exit
    #[arg(long)]
    list_services: bool,

    /// Print the final report as JSON
    #[arg(long, conflicts_with = "quiet")]
    json: bool,

    /// Suppress output, exit code only
    #[arg(short, long)]
    quiet: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Read configuration from this file as well
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_services {
        for key in ServiceKey::ALL {
            println!("{key}\t{}", key.label());
        }
        return ExitCode::SUCCESS;
    }

    let Some(name) = cli.name.as_deref() else {
        eprintln!("error: no project name provided");
        eprintln!("usage: nametrace [OPTIONS] <NAME>");
        return ExitCode::from(2);
    };

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let services = if cli.services.is_empty() {
        config.services.clone()
    } else {
        cli.services.clone()
    };

    let engine = Engine::new(config.transport());
    let mut session = match engine.check_name(name, services) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    info!(name = %session.request().name(), "checking");

    let streaming = !cli.quiet && !cli.json;
    let can_assess = session.request().can_assess_risk();

    for update in session.by_ref() {
        if streaming {
            print_update(&update);
        }
    }
    if streaming && !can_assess {
        println!("risk\tunavailable: enable both crates and github for a risk summary");
    }

    let report = session.finish();
    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(2);
            }
        }
    }

    exit_code(&report)
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_update(update: &Update) {
    match update {
        Update::Settled { key, result } => {
            let details = clamp(&key.display_details(result), MAX_DETAILS);
            println!("{}\t{}\t{details}", key.label(), result.status);
        }
        Update::Verdict(verdict) => {
            println!("risk\t{}", verdict.risk_level.to_string().to_uppercase());
            for reason in &verdict.reasons {
                println!("reason\t{reason}");
            }
        }
        Update::Suggestions(Suggestions::NotNeeded) => println!("suggestions\tnot needed"),
        Update::Suggestions(Suggestions::NoneAvailable) => {
            println!("suggestions\tnone available");
        }
        Update::Suggestions(Suggestions::Available(names)) => {
            for name in names {
                println!("suggestion\t{name}");
            }
        }
    }
}

fn clamp(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut clamped: String = text.chars().take(max - 1).collect();
    clamped.push('…');
    clamped
}

fn exit_code(report: &Report) -> ExitCode {
    if report.has_collision() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
