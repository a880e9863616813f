mod build;
mod commands;
mod core;
mod pipeline;
mod registry;
mod release;
mod telemetry;
mod ui;
mod utils;

use build::BuildConfiguration;
use clap::{Parser, Subcommand};
use crate::core::error::{ReleaseError, print_error};
use pipeline::Stage;
use tracing::Level;

/// Build, test, pack and publish one package with monotonic build numbers
#[derive(Parser)]
#[command(name = "release-rail")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Verbose logging (debug level unless RUST_LOG is set)
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Emit logs as JSON lines on stderr
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the release pipeline up to the given target stages (default: Pack)
  Run {
    /// Target stages: clean, restore, compile, test, pack, push
    #[arg(value_name = "TARGET")]
    targets: Vec<Stage>,
    /// Build configuration (default: release when CI is set, debug otherwise)
    #[arg(long, value_enum)]
    configuration: Option<BuildConfiguration>,
    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show the ordered stages a run would execute
  Plan {
    /// Target stages (default: Pack)
    #[arg(value_name = "TARGET")]
    targets: Vec<Stage>,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Inspect the package version record
  #[command(subcommand)]
  Version(VersionCommands),
}

#[derive(Subcommand)]
enum VersionCommands {
  /// Show the current version
  Show {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show the version the next run would release
  Next {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Release builds on CI, debug builds locally
fn default_configuration() -> BuildConfiguration {
  match std::env::var("CI") {
    Ok(value) if !value.is_empty() && value != "false" && value != "0" => BuildConfiguration::Release,
    _ => BuildConfiguration::Debug,
  }
}

fn main() {
  let cli = Cli::parse();

  let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
  telemetry::init_tracing(cli.log_json, level);

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(ReleaseError::message(format!("Failed to get current directory: {}", e))),
  };

  // Load release.toml once; every command needs it
  let ctx = match crate::core::context::ReleaseContext::build(&root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Run {
      targets,
      configuration,
      json,
    } => commands::run_release(&ctx, targets, configuration.unwrap_or_else(default_configuration), json),
    Commands::Plan { targets, json } => commands::run_plan(&ctx, targets, json),
    Commands::Version(version_cmd) => match version_cmd {
      VersionCommands::Show { json } => commands::run_version_show(&ctx, json),
      VersionCommands::Next { json } => commands::run_version_next(&ctx, json),
    },
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
