//! Line and table rendering for each output mode.
//!
//! Plain mode writes `key=value` fields so CI logs can be grepped; values
//! with whitespace, quotes or `=` are quoted.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{Cell, ContentArrangement, Table};

use super::context::UiContext;
use super::mode::OutputMode;
use super::theme::{styled, styles, Badge};

/// One plain-mode `key=value` field.
pub fn field(key: &str, value: &str) -> String {
    let needs_quotes =
        value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '"' || c == '=');
    if needs_quotes {
        format!("{}={:?}", key, value)
    } else {
        format!("{}={}", key, value)
    }
}

/// First line of a command's output, naming the directory it works on.
pub fn header(ctx: &UiContext, command: &str, dir: Option<&str>) -> String {
    match ctx.mode {
        OutputMode::Pretty => {
            let title = styled("confseal", styles::bold(), ctx.color);
            match dir {
                Some(dir) => format!(
                    "{} \u{00B7} {}\n{}",
                    title,
                    command,
                    kv(ctx, "Directory", dir)
                ),
                None => format!("{} \u{00B7} {}", title, command),
            }
        }
        OutputMode::Plain => match dir {
            Some(dir) => format!("{} {}", field("command", command), field("dir", dir)),
            None => field("command", command),
        },
        OutputMode::Json => String::new(),
    }
}

pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let token = styled(kind.display(ctx.unicode), kind.style(), ctx.color);
    if message.is_empty() {
        token
    } else {
        format!("{} {}", token, message)
    }
}

/// `Key: value` in pretty mode, `key=value` otherwise.
pub fn kv(ctx: &UiContext, key: &str, value: &str) -> String {
    if ctx.mode.is_pretty() {
        format!(
            "{} {}",
            styled(&format!("{}:", key), styles::dim(), ctx.color),
            value
        )
    } else {
        field(&key.to_lowercase().replace(' ', "_"), value)
    }
}

pub fn hint(ctx: &UiContext, text: &str) -> String {
    if ctx.mode.is_pretty() {
        format!("{} {}", styled("Hint:", styles::dim(), ctx.color), text)
    } else {
        field("hint", text)
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
}

impl Column {
    pub const fn new(header: &'static str) -> Self {
        Self { header }
    }
}

/// Bordered table in pretty mode; one line of fields per row otherwise,
/// keyed by the lowercased column headers.
pub fn table(ctx: &UiContext, columns: &[Column], rows: &[Vec<String>]) -> String {
    if !ctx.mode.is_pretty() {
        return rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| field(&column.header.to_lowercase(), value))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut table = Table::new();
    if ctx.unicode {
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(ASCII_MARKDOWN);
    }
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(u16::try_from(ctx.width).unwrap_or(u16::MAX))
        .set_header(columns.iter().map(|c| Cell::new(c.header)));
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

/// Write to stdout unless the command is producing JSON.
pub fn print(ctx: &UiContext, message: &str) {
    if !ctx.mode.is_json() {
        println!("{}", message);
    }
}

pub fn error_message(ctx: &UiContext, message: &str, error_hint: Option<&str>) -> String {
    let first = if ctx.mode.is_pretty() {
        badge(ctx, Badge::Err, message)
    } else {
        field("error", message)
    };
    match error_hint {
        Some(text) => format!("{}\n{}", first, hint(ctx, text)),
        None => first,
    }
}

/// Errors always go to stderr, in every mode.
pub fn print_error(ctx: &UiContext, message: &str, error_hint: Option<&str>) {
    eprintln!("{}", error_message(ctx, message, error_hint));
}
