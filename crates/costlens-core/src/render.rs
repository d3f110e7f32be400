//! HTML bodies for the overview and history panels.

use costlens_ledger::{CostRecord, History};
use std::fmt::Write;

/// Panel title of the overview.
pub const OVERVIEW_TITLE: &str = "Cost Overview";

/// Panel title of the history view.
pub const HISTORY_TITLE: &str = "Cost History";

const SELECTED_STYLE: &str = ".selected-method {\n  background-color: rgba(200, 200, 0, 0.2);\n}";

/// Renders the overview of `records`.
///
/// The record named `selected` is marked with `class="selected-method"`.
/// Constructors and static initializers are skipped when `hide_initializers`
/// is set.
pub fn render_overview(
    records: &[CostRecord],
    selected: Option<&str>,
    hide_initializers: bool,
) -> String {
    let mut body = String::new();
    for record in records {
        if hide_initializers && record.is_initializer() {
            continue;
        }

        let class = if selected == Some(record.method_name.as_str()) {
            " class=\"selected-method\""
        } else {
            ""
        };
        let _ = write!(
            body,
            "<div{}>\n<h2>{} (line {})</h2>\n{}</div>\n<hr>\n",
            class,
            escape_html(&record.method_name),
            record.location.lnum,
            cost_lines(record)
        );
    }

    page(OVERVIEW_TITLE, Some(SELECTED_STYLE), OVERVIEW_TITLE, &body)
}

/// Renders a method's history, most recent first. Returns `None` for an
/// empty history.
pub fn render_history(history: &History) -> Option<String> {
    let head = history.front()?;

    let mut body = String::new();
    for (i, entry) in history.iter().enumerate() {
        let captured = entry.timestamp.as_deref().unwrap_or("unknown time");
        let marker = if i == 0 { " (most recent)" } else { "" };
        let _ = write!(
            body,
            "<div>\n<h2>{}{}</h2>\n{}</div>\n<hr>\n",
            escape_html(captured),
            marker,
            cost_lines(entry)
        );
    }

    let heading = format!(
        "{} for: {} (line {})",
        HISTORY_TITLE,
        escape_html(&head.method_name),
        head.location.lnum
    );
    Some(page(HISTORY_TITLE, None, &heading, &body))
}

/// Escapes text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn cost_lines(record: &CostRecord) -> String {
    format!(
        "<div>Allocation cost: {} : {}</div>\n<div>Execution cost: {} : {}</div>\n",
        escape_html(&record.alloc_cost.polynomial),
        escape_html(&record.alloc_cost.big_o),
        escape_html(&record.exec_cost.polynomial),
        escape_html(&record.exec_cost.big_o)
    )
}

fn page(title: &str, style: Option<&str>, heading: &str, body: &str) -> String {
    let style = style
        .map(|css| format!("  <style>\n{}\n  </style>\n", css))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>{}</title>\n{}</head>\n<body>\n  <h1>{}</h1>\n  <div>\n    <hr>\n{}  </div>\n</body>\n</html>\n",
        title, style, heading, body
    )
}
