use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table, presets};
use serde::Serialize;
use std::io::Write;

use crate::theme::Tone;

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// One line per resource
    Compact,
}

#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// A resource that renders as one table row.
pub trait TableDisplay {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    fn to_compact(&self) -> String;
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Prints `rows` in the configured format.
    pub fn display_list<T>(&self, rows: &[T]) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
            OutputFormat::Compact => {
                for row in rows {
                    println!("{}", row.to_compact());
                }
            }
            OutputFormat::Table => {
                if rows.is_empty() {
                    self.info("No resources found");
                    return Ok(());
                }
                let mut table = self.create_table();
                self.add_table_header(&mut table, T::HEADERS);
                for row in rows {
                    table.add_row(row.cells());
                }
                println!("{table}");
            }
        }
        Ok(())
    }

    /// Prints a single resource; tables are rendered as field/value pairs.
    pub fn display_one<T>(&self, row: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(row)?),
            OutputFormat::Compact => println!("{}", row.to_compact()),
            OutputFormat::Table => {
                let mut table = self.create_table();
                for (header, value) in T::HEADERS.iter().zip(row.cells()) {
                    table.add_row(vec![Cell::new(header).add_attribute(Attribute::Bold), Cell::new(value)]);
                }
                println!("{table}");
            }
        }
        Ok(())
    }

    pub fn success(&self, message: &str) {
        self.say(Tone::Done, message);
    }

    /// Errors are printed even in quiet mode.
    pub fn error(&self, message: &str) {
        self.say(Tone::Failed, message);
    }

    /// A write refused because its organization or environment is gone.
    pub fn scope_missing(&self, message: &str) {
        self.say(Tone::ScopeMissing, message);
    }

    pub fn warning(&self, message: &str) {
        self.say(Tone::Caution, message);
    }

    pub fn info(&self, message: &str) {
        self.say(Tone::Hint, message);
    }

    pub fn verbose(&self, message: &str) {
        if self.options.verbose {
            self.say(Tone::Trace, message);
        }
    }

    pub fn progress(&self, message: &str) {
        if self.options.quiet || matches!(self.options.output_format, OutputFormat::Json) {
            return;
        }

        print!("\r{}...", self.styled(Tone::Busy, message));
        std::io::stdout().flush().ok();
    }

    pub fn clear_line(&self) {
        if self.options.quiet || matches!(self.options.output_format, OutputFormat::Json) {
            return;
        }

        print!("\r{}\r", " ".repeat(80));
        std::io::stdout().flush().ok();
    }

    fn say(&self, tone: Tone, message: &str) {
        if tone.is_failure() {
            eprintln!("{}", self.styled(tone, message));
        } else if tone == Tone::Trace {
            if !self.options.quiet {
                eprintln!("{}", self.styled(tone, message));
            }
        } else if !self.options.quiet {
            println!("{}", self.styled(tone, message));
        }
    }

    fn styled(&self, tone: Tone, message: &str) -> String {
        if self.options.no_color {
            format!("{} {message}", tone.glyph())
        } else {
            format!("{} {}", tone.glyph().color(tone.color()).bold(), message.color(tone.color()))
        }
    }

    fn create_table(&self) -> Table {
        let mut table = Table::new();
        if self.options.no_color {
            table.load_preset(presets::ASCII_FULL);
        } else {
            table.load_preset(presets::UTF8_FULL_CONDENSED);
        }
        table
    }

    fn add_table_header(&self, table: &mut Table, headers: &[&str]) {
        let cells: Vec<Cell> = headers
            .iter()
            .map(|header| {
                let cell = Cell::new(header).add_attribute(Attribute::Bold);
                if self.options.no_color { cell } else { cell.fg(TableColor::Cyan) }
            })
            .collect();
        table.set_header(cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: String,
        interval: u32,
    }

    impl TableDisplay for Row {
        const HEADERS: &'static [&'static str] = &["Name", "Interval"];

        fn cells(&self) -> Vec<String> {
            vec![self.name.clone(), self.interval.to_string()]
        }

        fn to_compact(&self) -> String {
            format!("{} every {}s", self.name, self.interval)
        }
    }

    fn rows() -> Vec<Row> {
        vec![Row {
            name: "disk-check".into(),
            interval: 60,
        }]
    }

    #[test]
    fn renders_every_format() {
        for output_format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Compact] {
            let manager = OutputManager::new(GlobalOptions {
                output_format,
                no_color: true,
                ..Default::default()
            });
            assert!(manager.display_list(&rows()).is_ok());
            assert!(manager.display_one(&rows()[0]).is_ok());
        }
    }

    #[test]
    fn plain_output_keeps_the_tone_glyph() {
        let manager = OutputManager::new(GlobalOptions {
            no_color: true,
            ..Default::default()
        });
        assert_eq!(manager.styled(Tone::ScopeMissing, "gone"), "∅ gone");
        assert_eq!(manager.styled(Tone::Done, "ok"), "✓ ok");
    }

    #[test]
    fn quiet_mode_prints_nothing_and_succeeds() {
        let manager = OutputManager::new(GlobalOptions {
            quiet: true,
            ..Default::default()
        });
        assert!(manager.display_list::<Row>(&[]).is_ok());
    }
}
