//! Terminal output for the CLI
//!
//! Everything goes to stdout so it can be piped next to the rendered
//! document. With colors off, each line gets a plain-text marker instead.

use crate::types::WorkerKind;
use owo_colors::OwoColorize;

/// Width of the stage column in `--stream` mode; fits `report_generated`.
const STAGE_WIDTH: usize = 16;

/// Colored or plain line printer
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "!".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// One workflow transition, e.g. `[planned         ] 3 task(s) planned`
    pub fn stage(&self, stage: &str, status: &str) {
        let label = format!("[{:<width$}]", stage, width = STAGE_WIDTH);
        if self.colored {
            println!("  {} {}", label.dimmed(), status.bright_white());
        } else {
            println!("  {} {}", label, status);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Identifier and display name per worker, identifier column sized to fit
    pub fn worker_table(&self, kinds: &[WorkerKind]) {
        let width = kinds
            .iter()
            .map(|k| k.as_str().len())
            .max()
            .unwrap_or(0)
            .max("Worker".len());

        let header = format!("{:<width$}  {}", "Worker", "Name", width = width);
        let rule = "-".repeat(header.len());
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", rule.dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", rule);
        }

        for kind in kinds {
            println!(
                "    {:<width$}  {}",
                kind.as_str(),
                kind.display_name(),
                width = width
            );
        }
    }

    pub fn newline(&self) {
        println!();
    }
}
