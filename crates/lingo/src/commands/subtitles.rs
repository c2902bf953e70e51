//! Subtitle file commands.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use lingo_core::subtitles::{entries_to_srt, parse_srt};

use crate::cli::{SrtAction, SrtCommand};

pub async fn execute(cmd: SrtCommand) -> Result<()> {
    match cmd.action {
        SrtAction::Normalize { file, output } => normalize(&file, output.as_deref()),
    }
}

/// Parse and re-serialize a subtitle file.
fn normalize(file: &Path, output: Option<&Path>) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let entries = parse_srt(&content);
    let normalized = entries_to_srt(&entries);

    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", normalized))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} cues to {}",
                "✓".green(),
                entries.len(),
                path.display()
            );
        }
        None => println!("{}", normalized),
    }
    Ok(())
}
