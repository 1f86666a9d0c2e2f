use anyhow::{Context, Result};
use baseliner::patch::showpath;
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "baseliner")]
#[command(about = "Review and promote baseline .update proposals", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List pending .update proposals and show their diffs
    Status {
        /// Files or directories to search (defaults to the current directory)
        path: Vec<PathBuf>,

        /// Recursively walk directories
        #[arg(short, long)]
        walk: bool,
    },

    /// Promote .update proposals over their originals
    Apply {
        /// Files or directories to search (defaults to the current directory)
        path: Vec<PathBuf>,

        /// Recursively walk directories
        #[arg(short, long)]
        walk: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status { path, walk } => cmd_status(path, walk),
        Commands::Apply { path, walk, yes } => cmd_apply(path, walk, yes),
    }
}

/// The original path a proposal file was generated from, if the file name
/// carries the `.update` marker (`foo.update.rs` -> `foo.rs`,
/// `foo.update` -> `foo`).
fn promoted_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;

    let original = if let Some(stem) = name.strip_suffix(".update") {
        stem.to_string()
    } else if let Some(index) = name.find(".update.") {
        format!("{}{}", &name[..index], &name[index + ".update".len()..])
    } else {
        return None;
    };

    Some(path.with_file_name(original))
}

/// Collect proposal files under the given paths.
fn discover_updates(paths: Vec<PathBuf>, walk: bool) -> Result<Vec<PathBuf>> {
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let mut updates = Vec::new();
    for path in paths {
        if path.is_file() {
            if promoted_path(&path).is_some() {
                updates.push(path);
            }
            continue;
        }

        let max_depth = if walk { usize::MAX } else { 1 };
        for entry in WalkDir::new(&path).max_depth(max_depth) {
            let entry = entry?;
            if entry.file_type().is_file() && promoted_path(entry.path()).is_some() {
                updates.push(entry.path().to_path_buf());
            }
        }
    }

    updates.sort();
    updates.dedup();
    Ok(updates)
}

/// Show a line diff between the original and its proposal.
fn display_diff(original: &Path, update: &Path) -> Result<()> {
    let before = if original.exists() {
        fs::read_to_string(original)
            .with_context(|| format!("failed to read {}", original.display()))?
    } else {
        String::new()
    };
    let after = fs::read_to_string(update)
        .with_context(|| format!("failed to read {}", update.display()))?;

    println!("{}", format!("--- {}", showpath(original)).dimmed());
    println!("{}", format!("+++ {}", showpath(update)).dimmed());

    let diff = TextDiff::from_lines(&before, &after);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => print!("{}", format!("-{change}").red()),
            ChangeTag::Insert => print!("{}", format!("+{change}").green()),
            ChangeTag::Equal => {}
        }
    }

    Ok(())
}

fn cmd_status(paths: Vec<PathBuf>, walk: bool) -> Result<()> {
    let updates = discover_updates(paths, walk)?;

    if updates.is_empty() {
        println!("No pending updates.");
        return Ok(());
    }

    println!("Found updates for:");
    for update in &updates {
        let original = promoted_path(update).expect("discovered paths carry the marker");
        println!("  {}", showpath(&original));
    }
    println!();

    for update in &updates {
        let original = promoted_path(update).expect("discovered paths carry the marker");
        display_diff(&original, update)?;
        println!();
    }

    Ok(())
}

fn cmd_apply(paths: Vec<PathBuf>, walk: bool, yes: bool) -> Result<()> {
    let updates = discover_updates(paths, walk)?;

    if updates.is_empty() {
        println!("No pending updates.");
        return Ok(());
    }

    println!("Found updates for:");
    for update in &updates {
        let original = promoted_path(update).expect("discovered paths carry the marker");
        println!("  {}", showpath(&original));
    }
    println!();

    if !yes && !confirm()? {
        println!("{}", "Update canceled.".yellow());
        return Ok(());
    }

    for update in &updates {
        let original = promoted_path(update).expect("discovered paths carry the marker");
        let content = fs::read_to_string(update)
            .with_context(|| format!("failed to read {}", update.display()))?;
        fs::write(&original, content)
            .with_context(|| format!("failed to write {}", original.display()))?;
        fs::remove_file(update)
            .with_context(|| format!("failed to remove {}", update.display()))?;
        println!(
            "{} {} {}",
            showpath(update),
            "->".green(),
            showpath(&original)
        );
    }

    Ok(())
}

fn confirm() -> Result<bool> {
    print!("Hit [ENTER] to update, [Ctrl-C] to cancel ");
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    Ok(read > 0)
}
