mod adapters;
mod cargo;
mod commands;
mod core;
mod graph;
mod ui;
mod utils;

use clap::Parser;
use commands::ImpactOptions;
use core::error::{ImpactError, print_error};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Find the workspace crates impacted by a set of git changes
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Impact(ImpactCli),
}

#[derive(Parser)]
#[command(name = "impact")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct ImpactCli {
  /// Workspace directory or its Cargo.toml
  workspace: PathBuf,

  /// Base revision to diff from
  base: String,

  /// Revision to diff to (default: HEAD, or `[diff] head` in impact.toml)
  #[arg(long)]
  head: Option<String>,

  /// Output format: text (default), json, names, dot
  #[arg(long)]
  format: Option<String>,

  /// Do not expand submodule pointer changes
  #[arg(long)]
  no_nested: bool,

  /// Show a progress bar while resolving project references
  #[arg(long)]
  progress: bool,

  /// Worker threads for parallel resolution
  #[arg(short, long)]
  jobs: Option<usize>,

  /// Verbose diagnostics on stderr (-v debug, -vv trace); RUST_LOG overrides
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
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

/// Diagnostics go to stderr so stdout stays machine-readable
fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "cargo_impact=debug",
    _ => "cargo_impact=trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
    .init();
}

fn main() {
  let CargoCli::Impact(cli) = CargoCli::parse();
  init_tracing(cli.verbose);

  let result = commands::run_affected(ImpactOptions {
    workspace: cli.workspace,
    base: cli.base,
    head: cli.head,
    format: cli.format,
    no_nested: cli.no_nested,
    progress: cli.progress,
    jobs: cli.jobs,
  });

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ImpactError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
