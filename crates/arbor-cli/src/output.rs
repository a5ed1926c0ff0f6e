//! Output formatting utilities

use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

/// A command result that can be shown as text or JSON
pub trait Report: Serialize {
    /// Human-readable rendering, one item per line
    fn table(&self) -> String;
}

/// Format output based on format type
pub fn format_output<T: Report>(data: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => data.table(),
    }
}

pub fn print_output<T: Report>(data: &T, format: OutputFormat) {
    println!("{}", format_output(data, format).trim_end());
}

/// `label: value` lines with the labels padded to one width
pub fn key_values(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(k, v)| format!("{:<width$}  {}\n", format!("{}:", k), v, width = width + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
    }

    impl Report for Sample {
        fn table(&self) -> String {
            format!("name {}", self.name)
        }
    }

    #[test]
    fn test_format_selection() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("csv"), OutputFormat::Table);

        let sample = Sample { name: "cell" };
        assert_eq!(format_output(&sample, OutputFormat::Table), "name cell");
        assert!(format_output(&sample, OutputFormat::Json).contains("\"name\": \"cell\""));
    }

    #[test]
    fn test_key_values_align() {
        let text = key_values(&[("a", "1".into()), ("long", "2".into())]);
        assert_eq!(text, "a:     1\nlong:  2\n");
    }
}
