use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tsei::commands;
use tsei::core::context::RunContext;
use tsei::core::error::{TseiError, print_error};
use tsei::core::logging::init_tracing;

/// Publish the internal declarations of every upstream compiler release
#[derive(Parser)]
#[command(name = "tsei")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Directory holding the ledger and package files
  #[arg(long, global = true, default_value = ".")]
  root: PathBuf,

  /// Config file (default: tsei.toml in the root)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Debug logging (RUST_LOG takes precedence)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build, transform and publish every pending tag
  Run {
    /// Build and validate, but skip commit, push and registry submission
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,
  },

  /// Show the tags a run would process
  Tags {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Summarize the ledger
  Status {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Transform a local declaration file
  Transform {
    /// Raw declaration bundle
    input: PathBuf,
    /// Release tag shown in messages
    #[arg(long)]
    tag: Option<String>,
    /// Write here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
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

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let ctx = match RunContext::build(&cli.root, cli.config.as_deref()) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match &cli.command {
    Commands::Run { dry_run } => commands::run_pipeline(&ctx, *dry_run),
    Commands::Tags { json } => commands::run_tags(&ctx, *json),
    Commands::Status { json } => commands::run_status(&ctx, *json),
    Commands::Transform { input, tag, output } => {
      commands::run_transform(&ctx, input, tag.as_deref(), output.as_deref())
    }
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: TseiError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
