use chrono::{DateTime, Local, Utc};
use humansize::{format_size as human_format_size, BINARY};

/// Format a byte count in binary units (`"1.5 GiB"`)
pub fn format_size(size: u64) -> String {
    human_format_size(size, BINARY.decimal_places(1))
}

/// Format a UTC timestamp in local time (HH:MM:SS)
pub fn format_clock(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%H:%M:%S").to_string()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Cut `text` to at most `width` characters, marking the cut with `...`
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= 3 {
        return text.chars().take(width).collect();
    }

    let mut out: String = text.chars().take(width - 3).collect();
    out.push_str("...");
    out
}

/// Fixed-width bar for a 0-100 percentage
pub fn usage_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}
