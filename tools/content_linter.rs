/// Content Linter — checks a story directory for broken references.
///
/// Usage: content_linter <content_dir> [--strict]

use choice_engine::core::lint::lint_content;
use choice_engine::schema::GameContent;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: content_linter <content_dir> [--strict]");
        println!("  --strict   treat warnings as errors");
        process::exit(0);
    }

    let content_dir = Path::new(&args[1]);
    let strict = args[2..].iter().any(|a| a == "--strict");

    if !content_dir.is_dir() {
        eprintln!("ERROR: '{}' is not a directory", content_dir.display());
        process::exit(1);
    }

    let content = match GameContent::load_dir(content_dir) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("ERROR: Failed to load content: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} categories, {} resources, {} scenes, {} endings",
        content.custom.len(),
        content.resources.len(),
        content.scenes.len(),
        content.endings.len()
    );

    let report = lint_content(&content);

    println!("\n=== Content Lint Report ===\n");

    if report.is_clean() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        report.errors.len(),
        report.warnings.len()
    );

    let failed = !report.errors.is_empty() || (strict && !report.warnings.is_empty());
    process::exit(if failed { 1 } else { 0 });
}
