//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use serde_json::Value;

use crate::domain::{RouteBatch, Row, RowsResponse};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// One row as `▸ key  attr=value ...`; groups get a marker and child count.
pub fn format_row(row: &Row) -> String {
    let marker = if row.is_group {
        format!("▸ {} ({})", row.group_key.bold(), row.child_count)
    } else {
        format!("  {}", row.group_key)
    };
    let attrs: Vec<String> = row
        .data
        .iter()
        .map(|(name, value)| match value {
            Value::String(s) => format!("{}={}", name.dimmed(), s),
            other => format!("{}={}", name.dimmed(), other),
        })
        .collect();
    if attrs.is_empty() {
        marker
    } else {
        format!("{}  {}", marker, attrs.join(" "))
    }
}

/// Print a `get_rows` response.
pub fn rows(response: &RowsResponse) {
    header(&format!(
        "{} rows (total {})",
        response.rows.len(),
        response.total_row_count
    ));
    for row in &response.rows {
        println!("  {}", format_row(row));
    }
}

/// Print a route-scoped batch.
pub fn batch(batch: &RouteBatch) {
    action(
        "push",
        &format!("{} ({} rows)", batch.route, batch.row_count),
    );
    for row in &batch.rows {
        println!("    {}", format_row(row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Node;

    #[test]
    fn given_group_row_when_formatting_then_shows_child_count_and_attributes() {
        colored::control::set_override(false);
        let row = Node::group("login", vec![Node::leaf("a"), Node::leaf("b")])
            .with_attribute("status", "passed")
            .to_row();

        assert_eq!(format_row(&row), "▸ login (2)  status=passed");
    }

    #[test]
    fn given_leaf_without_attributes_when_formatting_then_key_only() {
        colored::control::set_override(false);
        assert_eq!(format_row(&Node::leaf("x").to_row()), "  x");
    }
}
