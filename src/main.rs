use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use recap::cli::{Cli, Commands};
use recap::{RecapContext, commands, output};
use std::io;
use std::process;

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Log filtering comes from RECAP_LOG; default keeps only warnings.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("RECAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.quiet {
        output::set_verbosity(output::Verbosity::Quiet);
    } else if cli.verbose {
        output::set_verbosity(output::Verbosity::Verbose);
    }

    if !output::use_color() {
        colored::control::set_override(false);
    }

    match cli.command {
        None => {
            let ctx = RecapContext::new()?;
            let args = cli.analyze;
            commands::analyze::execute(
                &ctx,
                args.directory.as_deref(),
                args.since.as_deref(),
                args.short,
            )?;
        }
        Some(Commands::Analyze(args)) => {
            let ctx = RecapContext::new()?;
            commands::analyze::execute(
                &ctx,
                args.directory.as_deref(),
                args.since.as_deref(),
                args.short,
            )?;
        }
        Some(Commands::Config {
            key,
            value,
            unset,
            list,
        }) => {
            let mut ctx = RecapContext::new()?;
            commands::config::execute(&mut ctx, key.as_deref(), value, unset, list)?;
        }
        Some(Commands::Completion { shell }) => {
            print_completions(shell, &mut Cli::command());
        }
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
