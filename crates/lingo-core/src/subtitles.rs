//! SRT subtitle parsing and serialization.

use serde::{Deserialize, Serialize};

/// One subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Index as written in the source; renumbered on output
    pub index: String,
    pub start: String,
    pub end: String,
    /// Cue text, multi-line cues joined with single spaces
    pub text: String,
}

/// Parse SRT text into cues.
///
/// Blocks are separated by blank lines. A block needs an index line, a
/// timing line and at least one text line; shorter blocks are skipped.
pub fn parse_srt(content: &str) -> Vec<SubtitleEntry> {
    let content = content.replace('\r', "");
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }

    split_blocks(content)
        .filter_map(|block| {
            let lines: Vec<&str> = block.split('\n').collect();
            if lines.len() < 3 {
                return None;
            }
            let mut times = lines[1].split("-->");
            let start = times.next().unwrap_or_default().trim().to_string();
            let end = times.next().unwrap_or_default().trim().to_string();
            Some(SubtitleEntry {
                index: lines[0].trim().to_string(),
                start,
                end,
                text: lines[2..].join(" ").trim().to_string(),
            })
        })
        .collect()
}

/// Serialize cues back to SRT, numbering them from 1.
pub fn entries_to_srt(entries: &[SubtitleEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!("{}\n{} --> {}\n{}", i + 1, entry.start, entry.end, entry.text)
                .trim()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split on runs of two or more newlines.
fn split_blocks(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("\n\n")
        .filter(|block| !block.is_empty())
        .map(|block| block.trim_start_matches('\n'))
}
