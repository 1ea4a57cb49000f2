//! Output formatting utilities

use jukugo_core::{CharacterNode, CompoundEntry, GraphStats};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "csv" => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Rows that can be printed as a table or CSV
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

impl Tabular for CompoundEntry {
    fn headers() -> &'static [&'static str] {
        &["word", "reading", "position", "with", "meaning"]
    }

    fn row(&self) -> Vec<String> {
        let with: String = self
            .co_characters
            .iter()
            .map(|c| format!("{}@{}", c.character, c.position))
            .collect::<Vec<_>>()
            .join(" ");
        vec![
            self.word.clone(),
            self.reading.clone(),
            self.position.to_string(),
            with,
            self.meaning.clone(),
        ]
    }
}

impl Tabular for CharacterNode {
    fn headers() -> &'static [&'static str] {
        &["character", "level"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.glyph.to_string(), self.level.to_string()]
    }
}

impl Tabular for GraphStats {
    fn headers() -> &'static [&'static str] {
        &["characters", "words", "forms"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.characters.to_string(),
            self.words.to_string(),
            self.forms.to_string(),
        ]
    }
}

/// Format a serializable value as pretty JSON
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Format rows based on format type
pub fn format_output<T: Tabular + Serialize>(rows: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&rows),
        OutputFormat::Csv => format_csv(rows),
        OutputFormat::Table => format_table(rows),
    }
}

fn format_csv<T: Tabular>(rows: &[T]) -> String {
    let mut lines = vec![T::headers().join(",")];
    for row in rows {
        let fields: Vec<String> = row.row().iter().map(|f| csv_field(f)).collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_table<T: Tabular>(rows: &[T]) -> String {
    let headers = T::headers();
    let cells: Vec<Vec<String>> = rows.iter().map(Tabular::row).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 2);
    let header: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    lines.push(render_line(&header, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(render_line(row, &widths));
    }
    lines.join("\n")
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            if i == last {
                cell.clone()
            } else {
                let pad = width.saturating_sub(display_width(cell));
                format!("{}{}", cell, " ".repeat(pad))
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Terminal columns taken by `s`; CJK and kana are double width
fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| match c as u32 {
            0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF => 2,
            0xFE30..=0xFE4F | 0xFF00..=0xFF60 | 0xFFE0..=0xFFE6 | 0x20000..=0x3FFFD => 2,
            _ => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukugo_core::{CoCharacter, Level};

    fn entry() -> CompoundEntry {
        CompoundEntry {
            word: "木林".to_string(),
            reading: "もくりん".to_string(),
            meaning: "grove, thicket".to_string(),
            position: 0,
            co_characters: vec![CoCharacter {
                character: '林',
                position: 1,
            }],
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Table);
    }

    #[test]
    fn test_csv_quotes_fields() {
        let csv = format_output(&[entry()], OutputFormat::Csv);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "word,reading,position,with,meaning");
        assert_eq!(lines[1], "木林,もくりん,0,林@1,\"grove, thicket\"");
    }

    #[test]
    fn test_table_aligns_wide_characters() {
        let rows = vec![
            CharacterNode::new('木', Level::N5),
            CharacterNode::new('林', Level::N4),
        ];
        let table = format_output(&rows, OutputFormat::Table);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "CHARACTER  LEVEL");
        assert_eq!(lines[2], "木         N5");
        assert_eq!(lines[3], "林         N4");
    }

    #[test]
    fn test_json_is_an_array() {
        let json = format_output(&[entry()], OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["co_characters"][0]["character"], "林");
    }
}
