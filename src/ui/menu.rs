use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState},
};

use super::widgets::{highlight_style, panel};

/// A titled pick list. Used for the content type menu and the provider picker.
pub fn render_menu_view(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    entries: &[(String, String)],
    list_state: &mut ListState,
    accent: Color,
) {
    let items: Vec<ListItem> = entries
        .iter()
        .map(|(label, hint)| {
            ListItem::new(Line::from(vec![
                Span::raw(label.clone()),
                Span::raw("  "),
                Span::styled(hint.clone(), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(panel(title, accent))
        .highlight_style(highlight_style(accent))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, list_state);
}
