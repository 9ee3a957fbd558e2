//! Terminal rendering helpers: ANSI styling, aligned tables, progress bars.
//! All output is deterministic; nothing probes the terminal.

pub struct Styler {
    color_enabled: bool,
}

impl Styler {
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    fn wrap(&self, code: &str, s: &str) -> String {
        if !self.color_enabled {
            return s.to_string();
        }
        format!("{}{}\u{001b}[0m", code, s)
    }

    pub fn green(&self, s: &str) -> String {
        self.wrap("\u{001b}[32m", s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.wrap("\u{001b}[33m", s)
    }

    pub fn red(&self, s: &str) -> String {
        self.wrap("\u{001b}[31m", s)
    }

    pub fn gray(&self, s: &str) -> String {
        self.wrap("\u{001b}[90m", s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.wrap("\u{001b}[1m", s)
    }
}

/// Display width with a fixed heuristic: CJK, emoji and block elements count
/// as 2 columns, everything else as 1.
pub fn display_width(s: &str) -> usize {
    s.chars().map(|c| if is_wide_char(c) { 2 } else { 1 }).sum()
}

fn is_wide_char(c: char) -> bool {
    let cp = c as u32;
    (0x4E00..=0x9FFF).contains(&cp)
        || (0x3400..=0x4DBF).contains(&cp)
        || (0xF900..=0xFAFF).contains(&cp)
        || (0xFF00..=0xFFEF).contains(&cp)
        || (0xAC00..=0xD7AF).contains(&cp)
        || (0x1F300..=0x1F9FF).contains(&cp)
        || (0x2600..=0x27BF).contains(&cp)
        || (0x2580..=0x259F).contains(&cp)
}

fn pad_right(s: &str, width: usize) -> String {
    let dw = display_width(s);
    if dw >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - dw))
    }
}

pub fn render_simple_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            let w = display_width(cell);
            if i >= widths.len() {
                widths.push(w);
            } else {
                widths[i] = widths[i].max(w);
            }
        }
    }

    let render_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| pad_right(c, widths[i]))
            .collect::<Vec<String>>()
            .join("  ")
    };

    let header_line = render_row(&headers.iter().map(|h| h.to_string()).collect::<Vec<_>>());
    if rows.is_empty() {
        return header_line;
    }

    let body = rows
        .iter()
        .map(|r| render_row(r))
        .collect::<Vec<String>>()
        .join("\n");
    format!("{}\n{}", header_line, body)
}

pub fn render_progress_bar(percent: u32, width: usize) -> String {
    let filled = ((percent.min(100) as f64 / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
