use crate::core::{ExportConfirmation, FilterResult};
use std::io::{self, BufRead, Write};

const MAX_CELL_WIDTH: usize = 24;

pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si" | "sí"
    )
}

fn clip(value: &str) -> String {
    if value.chars().count() > MAX_CELL_WIDTH {
        let mut clipped: String = value.chars().take(MAX_CELL_WIDTH - 1).collect();
        clipped.push('…');
        clipped
    } else {
        value.to_string()
    }
}

/// Fixed-width text table of the first `limit` rows.
pub fn render_preview(result: &FilterResult, limit: usize) -> String {
    let rows: Vec<Vec<String>> = result
        .preview(limit)
        .iter()
        .map(|row| {
            (0..result.columns.len())
                .map(|idx| clip(row.value(idx).unwrap_or("")))
                .collect()
        })
        .collect();

    let headers: Vec<String> = result.columns.iter().map(|c| clip(c)).collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .map(|row| row[idx].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&format_line(&headers));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_line(row));
        out.push('\n');
    }
    if result.count() > rows.len() {
        out.push_str(&format!("... {} more rows\n", result.count() - rows.len()));
    }
    out
}

fn read_answer<R: BufRead, W: Write>(question: &str, input: &mut R, out: &mut W) -> io::Result<String> {
    write!(out, "{}", question)?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

/// Shows a preview and asks y/n. The conversation goes to stderr so stdout
/// stays free for the run summary. A closed or unreadable stdin counts as
/// "no".
pub struct ConsolePrompt {
    preview_rows: usize,
}

impl ConsolePrompt {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }

    pub fn ask<R: BufRead, W: Write>(
        &self,
        result: &FilterResult,
        destination: &str,
        input: &mut R,
        out: &mut W,
    ) -> io::Result<bool> {
        if result.is_empty() {
            writeln!(out, "No connections on non-working days were found.")?;
        } else {
            writeln!(out, "\nPreview of the filtered connections:")?;
            write!(out, "{}", render_preview(result, self.preview_rows))?;
        }

        let question = format!("Export {} rows to {}? (y/n): ", result.count(), destination);
        let answer = read_answer(&question, input, out)?;
        Ok(is_affirmative(&answer))
    }
}

impl ExportConfirmation for ConsolePrompt {
    fn confirm(&self, result: &FilterResult, destination: &str) -> bool {
        let stdin = io::stdin();
        match self.ask(result, destination, &mut stdin.lock(), &mut io::stderr()) {
            Ok(confirmed) => confirmed,
            Err(e) => {
                tracing::warn!("Could not read confirmation from stdin: {}", e);
                false
            }
        }
    }
}

/// Asks for the range bounds on stderr; Enter skips a bound.
pub fn prompt_date_range() -> io::Result<(Option<String>, Option<String>)> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stderr();
    let start = read_answer("Start date (YYYY-MM-DD, Enter to skip): ", &mut input, &mut out)?;
    let end = read_answer("End date (YYYY-MM-DD, Enter to skip): ", &mut input, &mut out)?;
    let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
    Ok((non_empty(start), non_empty(end)))
}
