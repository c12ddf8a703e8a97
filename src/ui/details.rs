use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::api::{AnimeInfo, Chapter, Episode, MangaInfo};

use super::widgets::{episode_number, highlight_style, panel};

struct Header<'a> {
    title: &'a str,
    status: Option<&'a str>,
    release_date: Option<&'a str>,
    extra: Option<&'a str>,
    genres: &'a [String],
    description: Option<&'a str>,
}

fn render_header(frame: &mut Frame, area: Rect, header: &Header, accent: Color) {
    let mut facts: Vec<Span> = Vec::new();
    for value in [header.status, header.release_date, header.extra]
        .into_iter()
        .flatten()
    {
        if !facts.is_empty() {
            facts.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
        }
        facts.push(Span::styled(value.to_string(), Style::default().fg(Color::Cyan)));
    }

    let mut lines = vec![Line::from(facts)];
    if !header.genres.is_empty() {
        lines.push(Line::styled(
            header.genres.join(", "),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(description) = header.description.filter(|d| !d.trim().is_empty()) {
        lines.push(Line::raw(""));
        lines.push(Line::raw(description.to_string()));
    }

    let paragraph = Paragraph::new(lines)
        .block(panel(header.title, accent))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn split(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(area);
    (chunks[0], chunks[1])
}

fn episode_list_item(ep: &Episode, total: usize) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(
            episode_number(ep.number, total),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - "),
        Span::raw(
            ep.title
                .clone()
                .unwrap_or_else(|| format!("Episode {}", ep.number)),
        ),
    ];

    if ep.is_filler {
        spans.push(Span::styled(" (filler)", Style::default().fg(Color::DarkGray)));
    }

    ListItem::new(Line::from(spans))
}

fn chapter_list_item(ch: &Chapter) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(
            format!("{:>6}", ch.number_label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - "),
        Span::raw(ch.title.clone()),
    ];

    if let Some(volume) = &ch.volume {
        spans.push(Span::styled(
            format!(" (vol. {})", volume),
            Style::default().fg(Color::DarkGray),
        ));
    }

    ListItem::new(Line::from(spans))
}

pub fn render_anime_details(
    frame: &mut Frame,
    area: Rect,
    info: &AnimeInfo,
    list_state: &mut ListState,
    accent: Color,
) {
    let (header_area, list_area) = split(area);

    render_header(
        frame,
        header_area,
        &Header {
            title: &info.title,
            status: info.status.as_deref(),
            release_date: info.release_date.as_deref(),
            extra: info.sub_or_dub.as_deref(),
            genres: &info.genres,
            description: info.description.as_deref(),
        },
        accent,
    );

    if info.episodes.is_empty() {
        let empty = Paragraph::new("No episodes listed.")
            .block(panel("Episodes", accent))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let total = info.total_episodes();
    let items: Vec<ListItem> = info
        .episodes
        .iter()
        .map(|ep| episode_list_item(ep, total))
        .collect();
    let title = format!("Episodes ({})", info.total_episodes());
    let list = List::new(items)
        .block(panel(&title, accent))
        .highlight_style(highlight_style(accent))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, list_area, list_state);
}

pub fn render_manga_details(
    frame: &mut Frame,
    area: Rect,
    info: &MangaInfo,
    list_state: &mut ListState,
    accent: Color,
) {
    let (header_area, list_area) = split(area);

    render_header(
        frame,
        header_area,
        &Header {
            title: &info.title,
            status: info.status.as_deref(),
            release_date: info.release_date.as_deref(),
            extra: None,
            genres: &info.genres,
            description: info.description.as_deref(),
        },
        accent,
    );

    if info.chapters.is_empty() {
        let empty = Paragraph::new("No chapters listed.")
            .block(panel("Chapters", accent))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let items: Vec<ListItem> = info.chapters.iter().map(chapter_list_item).collect();
    let title = format!("Chapters ({})", info.total_chapters());
    let list = List::new(items)
        .block(panel(&title, accent))
        .highlight_style(highlight_style(accent))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, list_area, list_state);
}
