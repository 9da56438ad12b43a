//! Index command: build the database and report what happened.
//!
//! Tree dumps go to stdout; the human-readable summary goes to stderr.

use colored::Colorize;
use pyscope::{IndexOptions, Indexer};

/// Errors listed individually before the rest are summarised.
const ERRORS_SHOWN: usize = 5;

/// Run the index command.
pub fn run(options: IndexOptions) -> Result<(), pyscope::Error> {
    eprintln!("{} {}...", "Indexing".cyan().bold(), options.base.display());

    let indexer = Indexer::new(options)?;
    let run = indexer.run()?;
    let stats = &run.stats;

    for (path, tree) in &run.trees {
        println!("{path}");
        println!("{tree:#}");
    }

    eprintln!();
    eprintln!(
        "{} {} files, {} tagged lines into {}",
        "Indexed".green().bold(),
        stats.files_indexed,
        stats.lines_emitted,
        indexer.options().output_path().display()
    );
    eprintln!("{}: {:.2?}", "Duration".dimmed(), stats.duration);

    if stats.files_skipped > 0 {
        eprintln!(
            "{}: {} files (see errors)",
            "Skipped".yellow(),
            stats.files_skipped
        );
    }

    if !stats.directories_skipped.is_empty() {
        eprintln!(
            "{}: {} directories (unreadable)",
            "Skipped".yellow(),
            stats.directories_skipped.len()
        );
    }

    if !stats.errors.is_empty() {
        eprintln!();
        eprintln!("{} ({}):", "Errors".red().bold(), stats.errors.len());
        for err in stats.errors.iter().take(ERRORS_SHOWN) {
            eprintln!("  {} {}: {}", "•".red(), err.path.display(), err.message);
        }
        if stats.errors.len() > ERRORS_SHOWN {
            eprintln!("  ... and {} more", stats.errors.len() - ERRORS_SHOWN);
        }
    }

    Ok(())
}
