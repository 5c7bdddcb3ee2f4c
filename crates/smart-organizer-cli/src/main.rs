mod commands;
mod logging;
mod progress;

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use smart_organizer_core::analyzer::{
    validate_and_clean_api_key, ApiKey, NameSuggester, OpenAiSuggester,
};
use smart_organizer_core::config::load_configuration;
use smart_organizer_core::{AppConfig, ContentAnalyzer, DisableReason, Organizer, RootFolder};
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {}", "Error loading configuration:".red(), err);
            process::exit(1);
        }
    };

    let Some(command) = args.command.as_ref() else {
        let _ = Cli::command().print_long_help();
        return Ok(());
    };

    if let Commands::PrintConfig = command {
        println!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let log_dir = config.log_dir_path();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let _guard = logging::init_logger(&log_dir);

    match command {
        Commands::Organize => run_organize(&args, &config)?,
        Commands::Reanalyze { dry_run } => run_reanalyze(&args, &config, *dry_run)?,
        Commands::TestApiKey => run_test_api_key(&args, &config)?,
        Commands::PrintConfig => {}
    }

    Ok(())
}

fn run_organize(args: &Cli, config: &AppConfig) -> anyhow::Result<()> {
    let roots = config.select_roots(&args.folders);
    if roots.is_empty() {
        warn!("No folders selected");
        return Ok(());
    }

    if !args.yes {
        print_roots("This will organize files in:", &roots);
        if !prompt_confirm("Proceed with organization?", Some(false))? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mut organizer = Organizer::new(config.clone(), build_analyzer(args, config))?;
    let reporter = CliReporter::new();
    let stats = organizer.run_organize(&roots, &reporter);

    println!();
    info!(
        "{} organized, {} skipped, {} failed",
        format!("{}", stats.files_organized).green(),
        format!("{}", stats.files_skipped).yellow(),
        format!("{}", stats.files_failed).red(),
    );
    info!(
        "Action log: {}",
        organizer.action_log().path().display().to_string().cyan()
    );

    Ok(())
}

fn run_reanalyze(args: &Cli, config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let roots = config.select_roots(&args.folders);
    if roots.is_empty() {
        warn!("No folders selected");
        return Ok(());
    }

    if !dry_run && !args.yes {
        print_roots("This will re-analyze and may move or rename files in:", &roots);
        if !prompt_confirm("Proceed with re-analysis?", Some(false))? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let mut organizer = Organizer::new(config.clone(), build_analyzer(args, config))?;
    let reporter = CliReporter::new();
    let stats = organizer.run_reconcile(&roots, dry_run, &reporter);

    println!();
    let mode = if dry_run { "DRY RUN".yellow() } else { "LIVE".green() };
    info!(
        "[{}] {} processed, {} renamed, {} moved, {} AI naming improvements",
        mode,
        format!("{}", stats.files_processed).cyan(),
        format!("{}", stats.files_renamed).green(),
        format!("{}", stats.files_moved).green(),
        format!("{}", stats.ai_improvements).cyan(),
    );
    if dry_run {
        info!("Run again without --dry-run to apply these changes");
    }

    Ok(())
}

fn run_test_api_key(args: &Cli, config: &AppConfig) -> anyhow::Result<()> {
    let raw = match api_key_from(args) {
        Some(key) => key,
        None => prompt_line("Enter your OpenAI API key: ")?,
    };

    let key = match validate_and_clean_api_key(&raw) {
        Ok(key) => key,
        Err(e) => bail!("API key format invalid: {}", e),
    };
    println!(
        "{} {} key format looks valid ({})",
        "✓".green(),
        key.kind(),
        key.redacted()
    );

    let suggester = new_suggester(key, config)?;
    match suggester.check_connection() {
        Ok(()) => {
            println!("{} API connection successful", "✓".green());
            Ok(())
        }
        Err(e) => bail!("API connection failed: {}", e),
    }
}

/// Decide the analyzer state once, before any folder is touched.
fn build_analyzer(args: &Cli, config: &AppConfig) -> ContentAnalyzer {
    if args.no_ai || !config.ai.enabled {
        info!("AI content analysis turned off - using rule-based naming");
        return ContentAnalyzer::disabled(DisableReason::TurnedOff);
    }

    let Some(raw) = api_key_from(args) else {
        warn!("No OpenAI API key found - using rule-based naming only");
        return ContentAnalyzer::disabled(DisableReason::NotConfigured);
    };

    let key = match validate_and_clean_api_key(&raw) {
        Ok(key) => key,
        Err(e) => {
            error!("API key format invalid: {}", e);
            return ContentAnalyzer::disabled(DisableReason::NotConfigured);
        }
    };
    info!("Using {} API key {}", key.kind(), key.redacted());

    match new_suggester(key, config) {
        Ok(suggester) if config.ai.verify_on_start => ContentAnalyzer::verified(Box::new(suggester)),
        Ok(suggester) => ContentAnalyzer::new(Box::new(suggester)),
        Err(e) => {
            error!("Failed to initialize AI client: {}", e);
            ContentAnalyzer::disabled(DisableReason::ConnectionFailed(e.to_string()))
        }
    }
}

fn new_suggester(key: ApiKey, config: &AppConfig) -> anyhow::Result<OpenAiSuggester> {
    Ok(OpenAiSuggester::new(
        key,
        &config.ai.api_base,
        &config.ai.model,
        config.ai.flavor,
        Duration::from_secs(config.ai.timeout_secs),
    )?)
}

fn api_key_from(args: &Cli) -> Option<String> {
    args.api_key
        .clone()
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty())
}

fn print_roots(header: &str, roots: &[RootFolder]) {
    println!("{}", header.bold());
    for root in roots {
        println!("  - {} ({})", root.name, root.resolved_path().display());
    }
}

fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
