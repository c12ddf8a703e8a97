use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::api::{ContentType, ProviderId, SearchResultItem};

use super::widgets::{highlight_style, panel, truncate};

fn count_label(item: &SearchResultItem) -> String {
    let unit = match item.content_type {
        ContentType::Anime => "ep",
        ContentType::Manga => "ch",
    };
    if item.count == 0 {
        format!("  ? {}", unit)
    } else {
        format!("{:>4} {}", item.count, unit)
    }
}

pub fn render_search_view(
    frame: &mut Frame,
    area: Rect,
    query: &str,
    results: &[SearchResultItem],
    list_state: &mut ListState,
    is_loading: bool,
    provider: ProviderId,
    content: ContentType,
    accent: Color,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    render_search_input(frame, chunks[0], query, is_loading, provider, content, accent);

    render_search_results(frame, chunks[1], results, list_state, accent);
}

fn render_search_input(
    frame: &mut Frame,
    area: Rect,
    query: &str,
    is_loading: bool,
    provider: ProviderId,
    content: ContentType,
    accent: Color,
) {
    let title = if is_loading {
        format!(" Search {} on {} (loading...) ", content, provider)
    } else {
        format!(" Search {} on {} ", content, provider)
    };

    let input = Paragraph::new(query)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .title(title)
                .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(input, area);

    frame.set_cursor_position((area.x + query.chars().count() as u16 + 1, area.y + 1));
}

fn render_search_results(
    frame: &mut Frame,
    area: Rect,
    results: &[SearchResultItem],
    list_state: &mut ListState,
    accent: Color,
) {
    if results.is_empty() {
        let empty = Paragraph::new("No results. Type to search, Enter to submit.")
            .block(panel("Results", accent))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let title_width = area.width.saturating_sub(14) as usize;

    let items: Vec<ListItem> = results
        .iter()
        .map(|r| {
            let count_style = if r.count == 0 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Cyan)
            };

            ListItem::new(Line::from(vec![
                Span::styled(count_label(r), count_style),
                Span::raw(" │ "),
                Span::styled(truncate(&r.title, title_width), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let title = format!("Results ({})", results.len());
    let list = List::new(items)
        .block(panel(&title, accent))
        .highlight_style(highlight_style(accent))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, list_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(count: u32, content_type: ContentType) -> SearchResultItem {
        SearchResultItem {
            id: "x".to_string(),
            title: "X".to_string(),
            image: None,
            count,
            content_type,
        }
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(&item(12, ContentType::Anime)), "  12 ep");
        assert_eq!(count_label(&item(0, ContentType::Manga)), "  ? ch");
    }
}
