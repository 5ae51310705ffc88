//! svglint CLI - lint SVG files against a rule configuration

use clap::{Parser, ValueEnum};
use colored::Colorize;
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use svglint::config::Config;
use svglint::engine::Linter;
use svglint::output::{FileReport, JsonFormatter, OutputFormatter, TextFormatter};
use svglint::registry::RuleRegistry;

#[derive(Parser)]
#[command(
    name = "svglint",
    version,
    about = "SVG linter",
    long_about = "Lints SVG files against a configurable set of rules (attr, elm, custom)."
)]
struct Cli {
    /// Files or glob patterns to lint
    files: Vec<String>,

    /// Configuration file path (default: .svglintrc.{yaml,yml,json} here or in $HOME)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Expand patterns into files, skipping those matching an ignore pattern
fn collect_files(patterns: &[String], ignore: &[Pattern]) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for pattern in patterns {
        if Path::new(pattern).is_file() {
            files.push(PathBuf::from(pattern));
            continue;
        }
        let paths = glob(pattern).map_err(|e| format!("Invalid pattern '{}': {}", pattern, e))?;
        files.extend(paths.flatten().filter(|entry| entry.is_file()));
    }

    files.retain(|file| {
        let ignored = ignore.iter().any(|p| p.matches_path(file));
        if ignored {
            log::debug!("Ignoring {}", file.display());
        }
        !ignored
    });
    Ok(files)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // Handle --no-color
    if cli.no_color {
        colored::control::set_override(false);
    }

    let registry = RuleRegistry::builtin();

    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        for name in registry.names() {
            println!("  {}", name.cyan());
        }
        return;
    }

    // Load configuration
    let loaded = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("{}: Failed to load config: {}", "error".red().bold(), e);
        std::process::exit(2);
    });

    if cli.files.is_empty() {
        eprintln!("{}: No files specified", "error".red().bold());
        eprintln!();
        eprintln!("Usage: svglint [OPTIONS] <FILES>...");
        eprintln!();
        eprintln!("For more information, try '--help'");
        std::process::exit(2);
    }

    let ignore: Vec<Pattern> = config
        .ignore
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("Invalid ignore pattern '{}': {}", p, e);
                None
            }
        })
        .collect();

    let files = collect_files(&cli.files, &ignore).unwrap_or_else(|e| {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(2);
    });

    if files.is_empty() {
        eprintln!("{}: No files found to lint", "error".red().bold());
        std::process::exit(2);
    }

    let linter = Linter::new(config.rules).with_registry(registry);

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        let input = file.to_string_lossy();
        let outcome = linter.run(&input).await;
        reports.push(FileReport::new(input, outcome));
    }

    let formatter: Box<dyn OutputFormatter> = match cli.format {
        Format::Text => {
            let formatter = TextFormatter::new();
            let formatter = if cli.no_color {
                formatter.without_color()
            } else {
                formatter
            };
            Box::new(if cli.verbose {
                formatter.with_logs()
            } else {
                formatter
            })
        }
        Format::Json => Box::new(JsonFormatter::new().pretty()),
    };
    print!("{}", formatter.format(&reports));

    // Exit with appropriate code
    let exit_code = if reports.iter().all(FileReport::passed) {
        0
    } else {
        1
    };
    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("b.svg"), "<svg/>").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();

        let pattern = format!("{}/*.svg", dir.path().display());
        let mut files = collect_files(&[pattern.clone()], &[]).unwrap();
        files.sort();
        assert_eq!(files.len(), 2);

        let ignore = [Pattern::new("*/b.svg").unwrap()];
        let files = collect_files(&[pattern], &ignore).unwrap();
        assert_eq!(files, vec![dir.path().join("a.svg")]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(collect_files(&["[".to_string()], &[]).is_err());
    }
}
