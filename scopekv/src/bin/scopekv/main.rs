mod commands;
mod context;
mod examples;
mod output;
mod theme;

use std::fmt::Write;
use std::io::{self, Write as IoWrite};
use std::path::PathBuf;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, Style},
    },
    error::ErrorKind,
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};

use commands::{
    check::{CheckCommands, handle_check_commands},
    environment::{EnvironmentCommands, handle_environment_commands},
    organization::{OrganizationCommands, handle_organization_commands},
};
use context::{BackendKind, ConnectOptions};
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{Tone, help};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL, used when --url is not given"),
    ("SCOPEKV_CONFIG", "Path to the config file (default .scopekv/config.toml)"),
    ("RUST_LOG", "Log filter, e.g. scopekv=debug"),
];

#[derive(Parser)]
#[command(name = "scopekv")]
#[command(version)]
#[command(
    about = "Manage tenant-scoped configuration in a key-value store",
    long_about = r#"Manage organizations, environments and checks stored under
tenant-scoped keys. Every write is rejected when its organization or
environment no longer exists.

Commands:
  organization  Create, update, delete and list organizations
  environment   Manage environments of an organization
  check         Manage check definitions of an environment
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Config file
    #[arg(long, env = "SCOPEKV_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Backend to talk to (memory is empty on every run)
    #[arg(long, value_enum, default_value = "redis", global = true)]
    backend: BackendKind,

    /// Backend URL (overrides the config file)
    #[arg(long, env = "REDIS_URL", global = true)]
    url: Option<String>,

    /// Key root all resources are stored under
    #[arg(long, global = true)]
    root: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output and debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage organizations
    #[command(subcommand, visible_alias = "org")]
    Organization(OrganizationCommands),

    /// Manage environments
    #[command(subcommand, visible_alias = "env")]
    Environment(EnvironmentCommands),

    /// Manage checks
    #[command(subcommand)]
    Check(CheckCommands),
}

impl Cli {
    fn parse_with_styles() -> Self {
        let matches = match build_cli_command().styles(help_styles()).try_get_matches() {
            Ok(matches) => matches,
            Err(err) => exit_with_clap_error(err),
        };
        match Cli::from_arg_matches(&matches) {
            Ok(cli) => cli,
            Err(err) => exit_with_clap_error(err),
        }
    }
}

fn exit_with_clap_error(err: clap::error::Error) -> ! {
    let to_stdout = matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
    if let Err(print_err) = err.print()
        && print_err.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("Failed to display message: {print_err}");
    }
    if to_stdout {
        let _ = io::stdout().flush();
    }
    std::process::exit(err.exit_code());
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .after_long_help(render_top_level_appendix(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });

    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            *subcommand = subcommand.clone().after_long_help(render_examples(example.groups, use_color));
        }
    }
    command
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", stylize("Examples:", help::HEADING, true, use_color));

    for (index, group) in groups.iter().enumerate() {
        let _ = writeln!(buffer, "  {}", stylize(group.title, help::USAGE, true, use_color));
        for command in group.commands {
            let arrow = stylize(Tone::Trace.glyph(), help::COMMAND, false, use_color);
            let _ = writeln!(buffer, "    {arrow} {}", stylize(command, help::COMMAND, false, use_color));
        }
        if index + 1 < groups.len() {
            buffer.push('\n');
        }
    }

    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let mut buffer = String::new();

    let _ = writeln!(buffer, "{}", stylize("Environment Variables:", help::HEADING, true, use_color));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(
            buffer,
            "  {}  {}",
            stylize(key, help::ENV_VAR, true, use_color),
            stylize(description, help::DESCRIPTION, false, use_color)
        );
    }

    let tip = stylize(
        "Use 'scopekv <command> --help' to view examples for each command.",
        help::COMMAND,
        false,
        use_color,
    );
    let _ = writeln!(buffer, "\n{} {tip}", stylize("Tip:", help::HEADING, true, use_color));

    buffer
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    match (use_color, bold) {
        (false, _) => text.to_string(),
        (true, true) => text.color(color).bold().to_string(),
        (true, false) => text.color(color).to_string(),
    }
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(style_from_color(help::USAGE).bold())
        .header(style_from_color(help::HEADING).bold())
        .literal(style_from_color(help::COMMAND))
        .placeholder(style_from_color(help::PLACEHOLDER))
        .valid(style_from_color(help::VALID))
        .invalid(style_from_color(help::INVALID))
        .error(style_from_color(help::ERROR).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    let ansi = match color {
        ThemeColor::Red => AnsiColor::Red,
        ThemeColor::Green => AnsiColor::Green,
        ThemeColor::Yellow => AnsiColor::Yellow,
        ThemeColor::Blue => AnsiColor::Blue,
        ThemeColor::Magenta => AnsiColor::Magenta,
        ThemeColor::Cyan => AnsiColor::Cyan,
        ThemeColor::BrightBlack => AnsiColor::BrightBlack,
        ThemeColor::BrightBlue => AnsiColor::BrightBlue,
        ThemeColor::BrightMagenta => AnsiColor::BrightMagenta,
        ThemeColor::BrightCyan => AnsiColor::BrightCyan,
        _ => AnsiColor::White,
    };
    Style::new().fg_color(Some(ClapColor::Ansi(ansi)))
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_with_styles();
    init_logging(cli.verbose);

    if let Err(err) = execute(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });
    if cli.no_color {
        colored::control::set_override(false);
    }

    let connect = ConnectOptions {
        config: cli.config,
        backend: cli.backend,
        url: cli.url,
        root: cli.root,
    };
    let store = connect.open(&output).await?;
    output.verbose(&format!("Using key root {}", store.root()));

    match cli.command {
        Commands::Organization(command) => handle_organization_commands(command, &store, &output).await,
        Commands::Environment(command) => handle_environment_commands(command, &store, &output).await,
        Commands::Check(command) => handle_check_commands(command, &store, &output).await,
    }
}
