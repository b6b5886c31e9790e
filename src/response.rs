// Response pair
// Every operation answers with `{ data, error }` instead of failing out-of-band;
// callers inspect `error` before trusting `data`

use crate::error::ApiError;
use crate::storage::{display_value, Record};
use serde::{Deserialize, Serialize};

/// The `{ data, error }` pair returned by every mock operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    pub data: T,
    pub error: Option<ApiError>,
}

impl<T> Response<T> {
    /// A successful response
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a Result so callers can use `?`
    pub fn into_result(self) -> Result<T, ApiError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

impl<T> Response<Option<T>> {
    /// A failed response carrying no data
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ApiError::new(message)),
        }
    }
}

/// Format records as a box-drawn table for display
/// Columns are the union of all field names, in first-seen order
pub fn format_table(rows: &[Record]) -> String {
    if rows.is_empty() {
        return "No rows found".to_string();
    }

    let mut column_names: Vec<&str> = Vec::new();
    for row in rows {
        for field in row.keys() {
            if !column_names.contains(&field.as_str()) {
                column_names.push(field);
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            column_names
                .iter()
                .map(|name| display_value(row.get(*name)))
                .collect()
        })
        .collect();

    // Calculate column widths
    let mut widths: Vec<usize> = column_names.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut result = String::new();

    result.push_str(&border(&widths, '┌', '┬', '┐'));

    result.push('│');
    for (name, width) in column_names.iter().zip(&widths) {
        result.push_str(&format!(" {:<width$} │", name, width = width));
    }
    result.push('\n');

    result.push_str(&border(&widths, '├', '┼', '┤'));

    for row in &cells {
        result.push('│');
        for (cell, width) in row.iter().zip(&widths) {
            result.push_str(&format!(" {:<width$} │", cell, width = width));
        }
        result.push('\n');
    }

    result.push_str(&border(&widths, '└', '┴', '┘'));
    result.push_str(&format!("\n{} row(s) returned", rows.len()));

    result
}

fn border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}\n", left, segments.join(&middle.to_string()), right)
}
