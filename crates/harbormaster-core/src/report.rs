//! Report rendering.
//!
//! Turns the ordered message set into the text the bot posts (tracker wiki
//! markup) or prints (ANSI, for dry runs and the console). Iteration order
//! of the set already is the render order; this module only formats.

use std::collections::BTreeSet;

use colored::Colorize;

use crate::message::{Severity, VerificationMessage};

/// Severity-color scheme for one output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Tracker wiki markup, used for posted comments.
    Wiki,
    /// ANSI escapes via `colored`, used for console output.
    Ansi,
}

impl Palette {
    fn paint(&self, severity: Severity, line: &str) -> String {
        match self {
            Palette::Wiki => {
                let color = match severity {
                    Severity::Required => "red",
                    Severity::Warning => "orange",
                    Severity::Info => "gray",
                };
                format!("{{color:{color}}}{line}{{color}}")
            }
            Palette::Ansi => match severity {
                Severity::Required => line.red().to_string(),
                Severity::Warning => line.yellow().to_string(),
                Severity::Info => line.cyan().to_string(),
            },
        }
    }

    fn mention(&self, reporter: &str) -> String {
        match self {
            Palette::Wiki => format!("[~{reporter}]"),
            Palette::Ansi => format!("@{reporter}"),
        }
    }
}

const BANNER: &str = "Hello, this is an automated review of the hosting request.\n\
    Items marked REQUIRED must be resolved before the request can be approved; \
    WARNING items should be looked at; INFO items are informational only.\n\n";

/// Render the full report for one run.
///
/// An empty set renders the all-clear line instead of an empty list; a
/// non-empty set gets the severity banner followed by the entries.
pub fn render_report(
    messages: &BTreeSet<VerificationMessage>,
    reporter: &str,
    palette: Palette,
) -> String {
    if messages.is_empty() {
        return format!(
            "{} everything is in order; all automated verification checks passed.",
            palette.mention(reporter)
        );
    }

    let mut out = String::from(BANNER);
    for message in messages {
        render_entry(&mut out, message, 1, palette);
    }
    out
}

/// Top-level entries carry the severity label and the palette color; nested
/// entries are plain, one marker deeper per level.
fn render_entry(out: &mut String, message: &VerificationMessage, depth: usize, palette: Palette) {
    let marker = "*".repeat(depth);
    if depth == 1 {
        let line = format!("{}: {}", message.severity.label(), message.text);
        out.push_str(&format!("{marker} {}\n", palette.paint(message.severity, &line)));
    } else {
        out.push_str(&format!("{marker} {}\n", message.text));
    }
    for sub in &message.sub_items {
        render_entry(out, sub, depth + 1, palette);
    }
}
