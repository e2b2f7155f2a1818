//! Report formatting: error blocks, tables, and shell-style command echoes.

#[derive(Default)]
pub(crate) struct ErrorDetails<'a> {
    pub(crate) hint: Option<&'a str>,
    pub(crate) details: Option<&'a str>,
}

pub(crate) fn format_error(message: &str, extra: ErrorDetails<'_>) -> String {
    let mut lines = vec![format!("Error: {message}")];
    if let Some(hint) = extra.hint.map(str::trim).filter(|value| !value.is_empty()) {
        lines.push(format!("Hint: {hint}"));
    }
    if let Some(details) = extra
        .details
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        lines.push(format!("Details: {details}"));
    }
    lines.join("\n")
}

pub(crate) fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (column, cell) in row.iter().enumerate() {
            if column < widths.len() {
                widths[column] = widths[column].max(cell.chars().count());
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(
        &headers
            .iter()
            .map(|header| header.to_string())
            .collect::<Vec<_>>(),
        &widths,
    ));
    for row in rows {
        lines.push(render_row(row, &widths));
    }
    lines.join("\n")
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let rendered: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(column, cell)| {
            let width = widths.get(column).copied().unwrap_or(0);
            format!("{cell:<width$}")
        })
        .collect();
    rendered.join("  ").trim_end().to_string()
}

pub(crate) fn format_command(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| shell_quote(part))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || "@%_+=:,./-".contains(ch))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\"'\"'"))
}
