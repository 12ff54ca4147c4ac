pub mod page;

use colored::Colorize;

use crate::directory::Category;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_text(sections: &[Category], color: bool) -> Vec<u8> {
    let mut out = String::new();
    for (idx, cat) in sections.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        if color {
            out.push_str(&format!("{}\n", cat.name.bold().white()));
        } else {
            out.push_str(&format!("{}\n", cat.name));
        }
        if !cat.description.is_empty() {
            if color {
                out.push_str(&format!("{}\n", cat.description.dimmed()));
            } else {
                out.push_str(&format!("{}\n", cat.description));
            }
        }
        for name in &cat.companies {
            out.push_str(&format!("  - {}\n", name));
        }
    }
    out.into_bytes()
}

pub fn render_json(sections: &[Category]) -> Vec<u8> {
    serde_json::to_vec_pretty(sections).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_html(sections: &[Category], term: &str) -> Vec<u8> {
    page::render_page(sections, term).into_bytes()
}

pub fn render(format: OutputFormat, sections: &[Category], term: &str, color: bool) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(sections, color),
        OutputFormat::Json => render_json(sections),
        OutputFormat::Html => render_html(sections, term),
    }
}
