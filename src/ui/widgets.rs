use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn panel(title: &str, accent: Color) -> Block<'static> {
    let title_style = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(Line::from(format!(" {} ", title)).style(title_style))
}

/// Bottom line of `key action` pairs, keys drawn in the accent color.
pub fn key_hints<'a>(hints: &[(&'a str, &'a str)], accent: Color) -> Paragraph<'a> {
    Paragraph::new(Line::from(hint_spans(hints, accent)))
}

fn hint_spans<'a>(hints: &[(&'a str, &'a str)], accent: Color) -> Vec<Span<'a>> {
    let mut spans = Vec::with_capacity(hints.len() * 4);
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(*key, Style::default().fg(accent).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(*action, Style::default().fg(Color::Gray)));
    }
    spans
}

/// Highlight style shared by every selectable list
pub fn highlight_style(accent: Color) -> Style {
    Style::default()
        .bg(accent)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

/// Zero-padded so a list of `total` episodes lines up; never narrower than 2.
pub fn episode_number(num: u32, total: usize) -> String {
    let width = total.to_string().len().max(2);
    format!("{:0width$}", num)
}

/// Cut `text` to `max_width` characters, ending in "..." when shortened.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return "...".to_string();
    }
    let kept: String = text.chars().take(max_width - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Any ratatui color name, `#rrggbb` or palette index. Unknown values get magenta.
pub fn parse_accent_color(color: &str) -> Color {
    match color.trim() {
        c if c.eq_ignore_ascii_case("grey") => Color::Gray,
        c => c.parse().unwrap_or(Color::Magenta),
    }
}
