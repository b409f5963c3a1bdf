//! Console output utilities
//!
//! Colored progress messages and table rendering for the command line.

use crossterm::style::{Color as CrosstermColor, Stylize};
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: CrosstermColor,
    pub success: CrosstermColor,
    pub warning: CrosstermColor,
    pub info: CrosstermColor,
    pub accent: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: CrosstermColor::Blue,
            success: CrosstermColor::Green,
            warning: CrosstermColor::Yellow,
            info: CrosstermColor::Cyan,
            accent: CrosstermColor::Magenta,
        }
    }
}

/// Styled status lines
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
}

impl DisplayUtils {
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
        }
    }

    fn styled(&self, symbol: &str, message: &str, color: CrosstermColor) -> String {
        if self.no_color {
            format!("{} {}", symbol, message)
        } else {
            format!("{} {}", symbol, message.with(color))
        }
    }

    pub fn header(&self, title: &str) -> String {
        if self.no_color {
            format!("=== {} ===", title)
        } else {
            format!("=== {} ===", title.with(self.theme.header).bold())
        }
    }

    pub fn print_header(&self, title: &str) {
        println!("{}", self.header(title));
    }

    pub fn print_success(&self, message: &str) {
        println!("{}", self.styled("✓", message, self.theme.success));
    }

    pub fn print_warning(&self, message: &str) {
        println!("{}", self.styled("⚠", message, self.theme.warning));
    }

    pub fn print_info(&self, message: &str) {
        println!("{}", self.styled("ℹ", message, self.theme.info));
    }

    /// Align keys into a column, one pair per line
    pub fn format_key_value_pairs(&self, pairs: &[(&str, String)]) -> String {
        let max_key_length = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        pairs
            .iter()
            .map(|(key, value)| {
                let padded = format!("{:width$}", key, width = max_key_length);
                if self.no_color {
                    format!("{}: {}", padded, value)
                } else {
                    format!("{}: {}", padded.with(self.theme.accent).bold(), value)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render rows as a rounded table, wrapped to the terminal width when known
pub fn format_table<T: Tabled>(rows: &[T], no_color: bool) -> String {
    if rows.is_empty() {
        return "No data to display".to_string();
    }

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Padding::new(1, 1, 0, 0));

    if !no_color {
        table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
    }

    if let Ok((width, _)) = crossterm::terminal::size() {
        table.with(Width::wrap(width as usize));
    }

    table.to_string()
}
