use std::future::Future;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{ListState, Paragraph},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{
    AnimeInfo, ChapterPages, ContentFacade, ContentType, MangaInfo, ProviderId, SearchResult,
    SearchResultItem, StreamInfo,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::player::{ImageViewer, MpvPlayer};
use crate::ui::{
    render_anime_details, render_manga_details, render_menu_view, render_search_view, widgets,
};

/// The provider and content type every request of the current browse goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub provider: ProviderId,
    pub content: ContentType,
}

/// Full record for the opened search result.
#[derive(Debug, Clone)]
pub enum Details {
    Anime(AnimeInfo),
    Manga(MangaInfo),
}

impl Details {
    pub fn len(&self) -> usize {
        match self {
            Details::Anime(info) => info.total_episodes(),
            Details::Manga(info) => info.total_chapters(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    ContentMenu,
    ProviderPicker,
    Search,
    Details,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Results of background work. Provider responses carry the id of the request
/// that produced them so that superseded ones can be dropped.
#[derive(Debug)]
pub enum AppMessage {
    SearchResults(u64, SearchResult),
    AnimeDetails(u64, AnimeInfo),
    MangaDetails(u64, MangaInfo),
    Stream(u64, StreamInfo),
    Pages(u64, ChapterPages),
    Failed(u64, Error),
    ExternalExited { program: String, success: bool },
}

impl AppMessage {
    fn request_id(&self) -> Option<u64> {
        match self {
            AppMessage::SearchResults(id, _)
            | AppMessage::AnimeDetails(id, _)
            | AppMessage::MangaDetails(id, _)
            | AppMessage::Stream(id, _)
            | AppMessage::Pages(id, _)
            | AppMessage::Failed(id, _) => Some(*id),
            AppMessage::ExternalExited { .. } => None,
        }
    }
}

/// Details endpoints without a title fall back to the id; the title the user
/// picked from the search list reads better in that case.
fn resolve_title(details_title: &str, id: &str, search_title: Option<&str>) -> String {
    match search_title {
        Some(title) if details_title.trim().is_empty() || details_title == id => title.to_string(),
        _ => details_title.to_string(),
    }
}

fn content_index(content: ContentType) -> usize {
    ContentType::ALL
        .iter()
        .position(|c| *c == content)
        .unwrap_or(0)
}

pub struct App {
    pub config: Config,
    pub facade: Arc<ContentFacade>,
    pub running: bool,
    pub view: View,
    pub previous_view: View,
    pub accent: Color,
    pub session: Session,

    pub content_state: ListState,
    pub provider_state: ListState,
    pub providers: Vec<ProviderId>,

    pub search_query: String,
    pub last_query: String,
    pub search_results: Vec<SearchResultItem>,
    pub search_state: ListState,

    pub details: Option<Details>,
    pub details_state: ListState,
    opened_title: Option<String>,

    /// One provider request in flight at a time.
    pub loading: bool,
    request_id: u64,
    /// The in-flight reply is discarded when it lands.
    abandoned: bool,
    pub status: Option<Status>,

    pub msg_tx: mpsc::UnboundedSender<AppMessage>,
    pub msg_rx: mpsc::UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(config: Config, facade: ContentFacade) -> Self {
        let accent = widgets::parse_accent_color(&config.ui.accent_color);

        let provider = config.general.default_provider;
        let content = ContentType::ALL
            .into_iter()
            .find(|c| provider.supports(*c))
            .unwrap_or(ContentType::Anime);

        let mut content_state = ListState::default();
        content_state.select(Some(content_index(content)));

        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        Self {
            config,
            facade: Arc::new(facade),
            running: true,
            view: View::ContentMenu,
            previous_view: View::ContentMenu,
            accent,
            session: Session { provider, content },
            content_state,
            provider_state: ListState::default(),
            providers: Vec::new(),
            search_query: String::new(),
            last_query: String::new(),
            search_results: Vec::new(),
            search_state: ListState::default(),
            details: None,
            details_state: ListState::default(),
            opened_title: None,
            loading: false,
            request_id: 0,
            abandoned: false,
            status: None,
            msg_tx,
            msg_rx,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events().await?;
            self.process_messages();
        }

        info!("Exiting");
        Ok(())
    }

    fn process_messages(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            if let Some(id) = msg.request_id() {
                if id != self.request_id {
                    debug!(id, current = self.request_id, "Dropping superseded response");
                    continue;
                }
                self.loading = false;
                if std::mem::take(&mut self.abandoned) {
                    debug!(id, "Dropping abandoned response");
                    continue;
                }
            }

            match msg {
                AppMessage::SearchResults(_, result) => {
                    info!(count = result.total_results(), "Search finished");
                    let empty = result.is_empty();
                    self.search_results = result.results;
                    self.search_state.select((!empty).then_some(0));
                    self.status = if empty {
                        Some(Status::Info("No results".to_string()))
                    } else {
                        None
                    };
                }
                AppMessage::AnimeDetails(_, mut info) => {
                    info.title = resolve_title(&info.title, &info.id, self.opened_title.as_deref());
                    self.show_details(Details::Anime(info));
                }
                AppMessage::MangaDetails(_, mut info) => {
                    info.title = resolve_title(&info.title, &info.id, self.opened_title.as_deref());
                    self.show_details(Details::Manga(info));
                }
                AppMessage::Stream(_, stream) => {
                    self.launch_player(stream);
                }
                AppMessage::Pages(_, pages) => {
                    self.launch_viewer(pages);
                }
                AppMessage::Failed(_, err) if err.is_unavailable() => {
                    info!(error = %err, "Operation not offered");
                    self.status = Some(Status::Info(err.to_string()));
                }
                AppMessage::Failed(_, err) => {
                    error!(error = %err, "Request failed");
                    self.status = Some(Status::Error(err.to_string()));
                }
                AppMessage::ExternalExited { program, success } => {
                    self.status = Some(if success {
                        Status::Info(format!("{} closed", program))
                    } else {
                        Status::Error(format!("{} exited with an error", program))
                    });
                }
            }
        }
    }

    fn show_details(&mut self, details: Details) {
        self.details_state.select((!details.is_empty()).then_some(0));
        self.details = Some(details);
        self.status = None;
        self.view = View::Details;
    }

    /// Run one facade call in the background; the closure gets the request id
    /// to stamp on its reply.
    fn spawn_request<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(Arc<ContentFacade>, u64) -> Fut,
        Fut: Future<Output = AppMessage> + Send + 'static,
    {
        if self.loading {
            return;
        }
        self.request_id += 1;
        self.loading = true;

        let tx = self.msg_tx.clone();
        let task = request(Arc::clone(&self.facade), self.request_id);
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    /// Leaving a view does not stop its request. `loading` stays set until
    /// the reply arrives, so no second request can start alongside it.
    fn abandon_pending(&mut self) {
        if self.loading && !self.abandoned {
            debug!(id = self.request_id, "Abandoning pending request");
            self.abandoned = true;
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let main_area = chunks[0];
        let status_area = chunks[1];
        let help_area = chunks[2];

        if self.view == View::Help {
            self.render_main(frame, main_area, self.previous_view);
            self.render_help(frame);
        } else {
            self.render_main(frame, main_area, self.view);
        }

        self.render_status(frame, status_area);

        let hints: &[(&str, &str)] = match self.view {
            View::ContentMenu => &[("j/k", "navigate"), ("Enter", "select"), ("?", "help"), ("q", "quit")],
            View::ProviderPicker => &[("j/k", "navigate"), ("Enter", "select"), ("Esc", "back")],
            View::Search => &[("Enter", "search/open"), ("Tab", "results"), ("Esc", "back")],
            View::Details => match self.session.content {
                ContentType::Anime => &[("j/k", "navigate"), ("Enter", "play"), ("Esc", "back")],
                ContentType::Manga => &[("j/k", "navigate"), ("Enter", "read"), ("Esc", "back")],
            },
            View::Help => &[("Esc", "close")],
        };
        frame.render_widget(widgets::key_hints(hints, self.accent), help_area);
    }

    fn render_main(&mut self, frame: &mut Frame, area: Rect, view: View) {
        match view {
            View::ContentMenu => {
                let entries: Vec<(String, String)> = ContentType::ALL
                    .iter()
                    .map(|c| {
                        let names: Vec<&str> = self
                            .facade
                            .registry()
                            .available(*c)
                            .iter()
                            .map(|p| p.as_display())
                            .collect();
                        (c.to_string(), names.join(", "))
                    })
                    .collect();
                render_menu_view(
                    frame,
                    area,
                    "kanshi",
                    &entries,
                    &mut self.content_state,
                    self.accent,
                );
            }
            View::ProviderPicker => {
                let entries: Vec<(String, String)> = self
                    .providers
                    .iter()
                    .map(|p| (p.as_display().to_string(), p.key().to_string()))
                    .collect();
                let title = format!("{} provider", self.session.content);
                render_menu_view(
                    frame,
                    area,
                    &title,
                    &entries,
                    &mut self.provider_state,
                    self.accent,
                );
            }
            View::Search => {
                render_search_view(
                    frame,
                    area,
                    &self.search_query,
                    &self.search_results,
                    &mut self.search_state,
                    self.loading,
                    self.session.provider,
                    self.session.content,
                    self.accent,
                );
            }
            View::Details => match &self.details {
                Some(Details::Anime(info)) => {
                    render_anime_details(frame, area, info, &mut self.details_state, self.accent)
                }
                Some(Details::Manga(info)) => {
                    render_manga_details(frame, area, info, &mut self.details_state, self.accent)
                }
                None => {}
            },
            View::Help => {}
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let line = if self.loading {
            Paragraph::new(" Loading...").style(Style::default().fg(Color::Yellow))
        } else {
            match &self.status {
                Some(Status::Error(msg)) => {
                    Paragraph::new(format!(" {}", msg)).style(Style::default().fg(Color::Red))
                }
                Some(Status::Info(msg)) => {
                    Paragraph::new(format!(" {}", msg)).style(Style::default().fg(Color::DarkGray))
                }
                None => Paragraph::new(""),
            }
        };
        frame.render_widget(line, area);
    }

    async fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(());
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    self.running = false;
                    return Ok(());
                }

                match self.view {
                    View::ContentMenu => self.handle_content_menu_input(key.code),
                    View::ProviderPicker => self.handle_provider_input(key.code),
                    View::Search => self.handle_search_input(key),
                    View::Details => self.handle_details_input(key.code),
                    View::Help => self.handle_help_input(key.code),
                }
            }
        }
        Ok(())
    }

    fn handle_content_menu_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                self.running = false;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_down(View::ContentMenu);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection_up(View::ContentMenu);
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                if let Some(content) = self
                    .content_state
                    .selected()
                    .and_then(|i| ContentType::ALL.get(i).copied())
                {
                    self.choose_content(content);
                }
            }
            KeyCode::Char('?') => {
                self.toggle_help();
            }
            _ => {}
        }
    }

    /// Goes straight to search when a single provider serves `content`.
    fn choose_content(&mut self, content: ContentType) {
        let providers = self.facade.registry().available(content);

        if providers.is_empty() {
            warn!(%content, "No provider registered");
            self.status = Some(Status::Error(format!("No provider supports {}", content)));
            return;
        }

        if providers.len() == 1 {
            self.providers = providers;
            self.start_session(Session {
                provider: self.providers[0],
                content,
            });
            return;
        }

        let preferred = if self.session.content == content {
            self.session.provider
        } else {
            self.config.general.default_provider
        };
        let selected = providers.iter().position(|p| *p == preferred).unwrap_or(0);
        self.provider_state.select(Some(selected));
        self.providers = providers;
        self.view = View::ProviderPicker;
    }

    fn handle_provider_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                self.running = false;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_down(View::ProviderPicker);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection_up(View::ProviderPicker);
            }
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => {
                self.view = View::ContentMenu;
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                let Some(provider) = self
                    .provider_state
                    .selected()
                    .and_then(|i| self.providers.get(i).copied())
                else {
                    return;
                };
                let content = self
                    .content_state
                    .selected()
                    .and_then(|i| ContentType::ALL.get(i).copied())
                    .unwrap_or(self.session.content);
                self.start_session(Session { provider, content });
            }
            KeyCode::Char('?') => {
                self.toggle_help();
            }
            _ => {}
        }
    }

    fn start_session(&mut self, session: Session) {
        if session != self.session {
            self.search_results.clear();
            self.search_state.select(None);
            self.last_query.clear();
            self.details = None;
        }
        info!(provider = %session.provider, content = %session.content, "Session started");
        self.session = session;
        self.status = None;
        self.view = View::Search;
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.abandon_pending();
                self.view = if self.providers.len() > 1 {
                    View::ProviderPicker
                } else {
                    View::ContentMenu
                };
            }
            KeyCode::Tab | KeyCode::Down => {
                self.move_selection_down(View::Search);
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.move_selection_up(View::Search);
            }
            KeyCode::Backspace => {
                self.search_query.pop();
            }
            KeyCode::Enter => {
                let edited = self.search_query.trim() != self.last_query;
                if edited || self.search_results.is_empty() {
                    self.perform_search();
                } else {
                    self.open_selected_result();
                }
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.search_query.push(c);
                }
            }
            _ => {}
        }
    }

    fn perform_search(&mut self) {
        let query = self.search_query.trim().to_string();
        if query.is_empty() || self.loading {
            return;
        }

        self.search_results.clear();
        self.search_state.select(None);
        self.status = None;
        self.last_query = query.clone();

        let Session { provider, content } = self.session;
        debug!(%provider, %content, query = %query, "Searching");

        self.spawn_request(move |facade, id| async move {
            match facade.search(provider, content, &query).await {
                Ok(result) => AppMessage::SearchResults(id, result),
                Err(e) => AppMessage::Failed(id, e),
            }
        });
    }

    fn open_selected_result(&mut self) {
        let Some(item) = self
            .search_state
            .selected()
            .and_then(|i| self.search_results.get(i))
            .cloned()
        else {
            return;
        };

        if item.id.is_empty() {
            self.status = Some(Status::Error(format!("\"{}\" has no id", item.title)));
            return;
        }

        self.opened_title = Some(item.title);
        let provider = self.session.provider;
        let entry_id = item.id;

        match self.session.content {
            ContentType::Anime => self.spawn_request(move |facade, id| async move {
                match facade.anime_details(provider, &entry_id).await {
                    Ok(info) => AppMessage::AnimeDetails(id, info),
                    Err(e) => AppMessage::Failed(id, e),
                }
            }),
            ContentType::Manga => self.spawn_request(move |facade, id| async move {
                match facade.manga_details(provider, &entry_id).await {
                    Ok(info) => AppMessage::MangaDetails(id, info),
                    Err(e) => AppMessage::Failed(id, e),
                }
            }),
        }
    }

    fn handle_details_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                self.running = false;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_down(View::Details);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection_up(View::Details);
            }
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => {
                self.abandon_pending();
                self.view = View::Search;
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                self.open_selected_entry();
            }
            KeyCode::Char('?') => {
                self.toggle_help();
            }
            _ => {}
        }
    }

    /// Fetch the stream or pages for the highlighted episode or chapter.
    fn open_selected_entry(&mut self) {
        let Some(idx) = self.details_state.selected() else {
            return;
        };
        let provider = self.session.provider;

        match &self.details {
            Some(Details::Anime(info)) => {
                let Some(episode) = info.episodes.get(idx) else {
                    return;
                };
                let episode_id = episode.id.clone();
                let number = episode.number;
                let server = self
                    .config
                    .providers
                    .server_for(provider)
                    .map(str::to_string);

                self.status = Some(Status::Info(format!("Episode {}", number)));
                self.spawn_request(move |facade, id| async move {
                    match facade
                        .episode_stream(provider, &episode_id, server.as_deref())
                        .await
                    {
                        Ok(stream) => AppMessage::Stream(id, stream),
                        Err(e) => AppMessage::Failed(id, e),
                    }
                });
            }
            Some(Details::Manga(info)) => {
                let Some(chapter) = info.chapters.get(idx) else {
                    return;
                };
                let chapter_id = chapter.id.clone();
                let label = chapter.number_label();

                self.status = Some(Status::Info(format!("Chapter {}", label)));
                self.spawn_request(move |facade, id| async move {
                    match facade.chapter_pages(provider, &chapter_id).await {
                        Ok(pages) => AppMessage::Pages(id, pages),
                        Err(e) => AppMessage::Failed(id, e),
                    }
                });
            }
            None => {}
        }
    }

    fn launch_player(&mut self, stream: StreamInfo) {
        let mut player = MpvPlayer::from_config(&self.config.player);
        if let Err(e) = player.play(&stream) {
            error!(error = %e, "Could not start player");
            self.status = Some(Status::Error(e.to_string()));
            return;
        }

        let program = self.config.player.command.clone();
        self.status = Some(Status::Info(format!("Playing in {}", program)));

        let tx = self.msg_tx.clone();
        tokio::task::spawn_blocking(move || {
            let success = player.wait().unwrap_or(false);
            let _ = tx.send(AppMessage::ExternalExited { program, success });
        });
    }

    fn launch_viewer(&mut self, pages: ChapterPages) {
        let viewer = ImageViewer::from_config(&self.config.viewer);
        let open = match viewer.open(&pages) {
            Ok(open) => open,
            Err(e) => {
                error!(error = %e, "Could not open chapter");
                self.status = Some(Status::Error(e.to_string()));
                return;
            }
        };

        let program = open.command().to_string();
        self.status = Some(Status::Info(format!(
            "{} pages in {}",
            pages.page_count(),
            program
        )));

        let tx = self.msg_tx.clone();
        tokio::task::spawn_blocking(move || {
            let success = open.wait().unwrap_or(false);
            let _ = tx.send(AppMessage::ExternalExited { program, success });
        });
    }

    fn move_selection_down(&mut self, view: View) {
        let (state, len) = match view {
            View::ContentMenu => (&mut self.content_state, ContentType::ALL.len()),
            View::ProviderPicker => (&mut self.provider_state, self.providers.len()),
            View::Search => (&mut self.search_state, self.search_results.len()),
            View::Details => (
                &mut self.details_state,
                self.details.as_ref().map(Details::len).unwrap_or(0),
            ),
            View::Help => return,
        };

        if len == 0 {
            return;
        }

        let next = match state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        state.select(Some(next));
    }

    fn move_selection_up(&mut self, view: View) {
        let (state, len) = match view {
            View::ContentMenu => (&mut self.content_state, ContentType::ALL.len()),
            View::ProviderPicker => (&mut self.provider_state, self.providers.len()),
            View::Search => (&mut self.search_state, self.search_results.len()),
            View::Details => (
                &mut self.details_state,
                self.details.as_ref().map(Details::len).unwrap_or(0),
            ),
            View::Help => return,
        };

        if len == 0 {
            return;
        }

        let prev = match state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        state.select(Some(prev));
    }

    fn toggle_help(&mut self) {
        if self.view == View::Help {
            self.view = self.previous_view;
        } else {
            self.previous_view = self.view;
            self.view = View::Help;
        }
    }

    fn render_help(&self, frame: &mut Frame) {
        use ratatui::style::Modifier;
        use ratatui::widgets::{Block, Borders, Clear, Row, Table};

        let area = frame.area();
        let dialog_area = Rect {
            x: area.width.saturating_sub(70) / 2,
            y: area.height.saturating_sub(18) / 2,
            width: 70.min(area.width),
            height: 18.min(area.height),
        };

        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.accent));

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let rows = vec![
            Row::new(vec!["Global", "?", "Toggle Help"]),
            Row::new(vec!["", "q / Ctrl-c", "Quit"]),
            Row::new(vec!["Menus", "j/k", "Navigate"]),
            Row::new(vec!["", "Enter/l", "Select"]),
            Row::new(vec!["", "Esc/h", "Back"]),
            Row::new(vec!["Search", "type", "Edit query"]),
            Row::new(vec!["", "Enter", "Search, or open result"]),
            Row::new(vec!["", "Tab/Up/Down", "Navigate Results"]),
            Row::new(vec!["", "Esc", "Back"]),
            Row::new(vec!["Details", "Enter", "Play episode / read chapter"]),
            Row::new(vec!["", "Esc", "Back to results"]),
        ];

        let table = Table::new(
            rows,
            &[
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Percentage(55),
            ],
        )
        .header(
            Row::new(vec!["Context", "Key", "Action"]).style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(self.accent),
            ),
        )
        .block(Block::default().borders(Borders::NONE));

        frame.render_widget(table, inner);
    }

    fn handle_help_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.toggle_help();
            }
            _ => {}
        }
    }
}

pub fn init_terminal() -> io::Result<DefaultTerminal> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    Ok(ratatui::init())
}

pub fn restore_terminal() -> io::Result<()> {
    ratatui::restore();
    Ok(())
}

const KANSHI_LETTERS: [[&str; 6]; 6] = [
    [
        "██╗  ██╗",
        "██║ ██╔╝",
        "█████╔╝ ",
        "██╔═██╗ ",
        "██║  ██╗",
        "╚═╝  ╚═╝",
    ],
    [
        " █████╗ ",
        "██╔══██╗",
        "███████║",
        "██╔══██║",
        "██║  ██║",
        "╚═╝  ╚═╝",
    ],
    [
        "███╗   ██╗",
        "████╗  ██║",
        "██╔██╗ ██║",
        "██║╚██╗██║",
        "██║ ╚████║",
        "╚═╝  ╚═══╝",
    ],
    [
        "███████╗",
        "██╔════╝",
        "███████╗",
        "╚════██║",
        "███████║",
        "╚══════╝",
    ],
    [
        "██╗  ██╗",
        "██║  ██║",
        "███████║",
        "██╔══██║",
        "██║  ██║",
        "╚═╝  ╚═╝",
    ],
    ["██╗", "██║", "██║", "██║", "██║", "╚═╝"],
];

const KANSHI_TAGLINE: &str = "監視 - to keep watch";

/// The wordmark with the first `letters` letters drawn.
fn splash_frame(letters: usize) -> String {
    let shown = &KANSHI_LETTERS[..letters.min(KANSHI_LETTERS.len())];
    (0..6)
        .map(|row| {
            shown
                .iter()
                .map(|letter| letter[row])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn play_splash(terminal: &mut DefaultTerminal, accent: Color) -> io::Result<()> {
    use ratatui::{
        layout::Alignment,
        text::{Line, Text},
    };

    let draw_logo = |terminal: &mut DefaultTerminal, text: &str, tagline: bool| {
        terminal.draw(|f| {
            let area = f.area();
            let lines = text.lines().count() as u16;
            let y_offset = area.height.saturating_sub(lines + 2) / 2;

            let logo_area = Rect {
                x: 0,
                y: y_offset,
                width: area.width,
                height: lines.min(area.height),
            };
            let logo = Paragraph::new(Text::styled(text.to_string(), Style::default().fg(accent)))
                .alignment(Alignment::Center);
            f.render_widget(logo, logo_area);

            if tagline {
                let tagline_area = Rect {
                    x: 0,
                    y: (y_offset + lines + 1).min(area.height.saturating_sub(1)),
                    width: area.width,
                    height: 1,
                };
                let tagline = Paragraph::new(Line::styled(
                    KANSHI_TAGLINE,
                    Style::default().fg(Color::DarkGray),
                ))
                .alignment(Alignment::Center);
                f.render_widget(tagline, tagline_area);
            }
        })
        .map(|_| ())
    };

    for letters in 1..=KANSHI_LETTERS.len() {
        draw_logo(terminal, &splash_frame(letters), false)?;
        thread::sleep(Duration::from_millis(120));
    }

    draw_logo(terminal, &splash_frame(KANSHI_LETTERS.len()), true)?;
    thread::sleep(Duration::from_millis(800));

    terminal.draw(|_f| {})?;
    thread::sleep(Duration::from_millis(100));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Registry;
    use crate::api::http::stub::StubFetch;
    use crate::api::providers::{AniWatch, MangaDex, Zoro, mangadex};
    use crate::api::{Chapter, Episode};

    fn test_app(stub: Arc<StubFetch>) -> App {
        let registry = Registry::new(vec![
            Box::new(AniWatch::new(stub.clone())),
            Box::new(Zoro::new(stub.clone())),
            Box::new(MangaDex::new(stub)),
        ]);
        App::new(Config::default(), ContentFacade::new(registry))
    }

    fn anime(id: &str, title: &str, episodes: usize) -> AnimeInfo {
        AnimeInfo {
            id: id.to_string(),
            title: title.to_string(),
            url: None,
            image: None,
            description: None,
            release_date: None,
            status: None,
            genres: vec![],
            sub_or_dub: None,
            episodes: (1..=episodes as u32)
                .map(|n| Episode {
                    id: format!("{}-ep-{}", id, n),
                    number: n,
                    title: None,
                    url: None,
                    is_filler: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_resolve_title() {
        assert_eq!(resolve_title("frieren-18542", "frieren-18542", Some("Frieren")), "Frieren");
        assert_eq!(resolve_title("", "x", Some("Frieren")), "Frieren");
        assert_eq!(resolve_title("Sousou no Frieren", "x", Some("Frieren")), "Sousou no Frieren");
        assert_eq!(resolve_title("x", "x", None), "x");
    }

    #[test]
    fn test_starts_on_default_provider_content() {
        let app = test_app(Arc::new(StubFetch::new()));
        assert_eq!(app.view, View::ContentMenu);
        assert_eq!(app.session.provider, ProviderId::Zoro);
        assert_eq!(app.session.content, ContentType::Anime);
        assert_eq!(app.content_state.selected(), Some(0));
    }

    #[test]
    fn test_single_provider_skips_picker() {
        let mut app = test_app(Arc::new(StubFetch::new()));
        app.choose_content(ContentType::Manga);
        assert_eq!(app.view, View::Search);
        assert_eq!(
            app.session,
            Session {
                provider: ProviderId::MangaDex,
                content: ContentType::Manga
            }
        );
    }

    #[test]
    fn test_picker_preselects_default_provider() {
        let mut app = test_app(Arc::new(StubFetch::new()));
        app.choose_content(ContentType::Anime);
        assert_eq!(app.view, View::ProviderPicker);
        assert_eq!(app.providers, vec![ProviderId::AniWatch, ProviderId::Zoro]);
        assert_eq!(app.provider_state.selected(), Some(1));

        app.handle_provider_input(KeyCode::Char('k'));
        app.handle_provider_input(KeyCode::Enter);
        assert_eq!(app.view, View::Search);
        assert_eq!(app.session.provider, ProviderId::AniWatch);
    }

    #[test]
    fn test_no_provider_for_content() {
        let stub = Arc::new(StubFetch::new());
        let registry = Registry::new(vec![Box::new(Zoro::new(stub))]);
        let mut app = App::new(Config::default(), ContentFacade::new(registry));
        app.choose_content(ContentType::Manga);
        assert_eq!(app.view, View::ContentMenu);
        assert!(matches!(app.status, Some(Status::Error(_))));
    }

    #[test]
    fn test_details_replace_search_item() {
        let mut app = test_app(Arc::new(StubFetch::new()));
        app.request_id = 4;
        app.loading = true;
        app.opened_title = Some("Frieren".to_string());

        let tx = app.msg_tx.clone();
        tx.send(AppMessage::AnimeDetails(4, anime("frieren-18542", "frieren-18542", 3)))
            .unwrap();
        app.process_messages();

        assert!(!app.loading);
        assert_eq!(app.view, View::Details);
        assert_eq!(app.details_state.selected(), Some(0));
        match &app.details {
            Some(Details::Anime(info)) => {
                assert_eq!(info.title, "Frieren");
                assert_eq!(info.total_episodes(), 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_superseded_response_dropped() {
        let mut app = test_app(Arc::new(StubFetch::new()));
        app.request_id = 2;
        app.loading = true;

        app.msg_tx
            .send(AppMessage::AnimeDetails(1, anime("old", "Old", 1)))
            .unwrap();
        app.process_messages();

        assert!(app.details.is_none());
        assert!(app.loading);
        assert_eq!(app.view, View::ContentMenu);
    }

    #[test]
    fn test_failure_sets_status() {
        let mut app = test_app(Arc::new(StubFetch::new()));
        app.request_id = 1;
        app.loading = true;
        app.msg_tx
            .send(AppMessage::Failed(
                1,
                Error::UpstreamRejected("Anime not found".to_string()),
            ))
            .unwrap();
        app.process_messages();
        assert!(!app.loading);
        assert_eq!(
            app.status,
            Some(Status::Error(
                "Provider rejected the request: Anime not found".to_string()
            ))
        );
    }

    #[test]
    fn test_unavailable_is_not_an_error_status() {
        let mut app = test_app(Arc::new(StubFetch::new()));
        app.request_id = 1;
        app.loading = true;
        app.msg_tx
            .send(AppMessage::Failed(
                1,
                Error::CapabilityUnavailable {
                    provider: ProviderId::Zoro,
                    content: ContentType::Manga,
                },
            ))
            .unwrap();
        app.process_messages();
        assert_eq!(
            app.status,
            Some(Status::Info("Zoro does not support Manga".to_string()))
        );
    }

    #[test]
    fn test_selection_bounds_on_chapters() {
        let mut app = test_app(Arc::new(StubFetch::new()));
        app.show_details(Details::Manga(MangaInfo {
            id: "m".to_string(),
            title: "M".to_string(),
            url: None,
            image: None,
            description: None,
            release_date: None,
            status: None,
            genres: vec![],
            chapters: vec![Chapter {
                id: "c1".to_string(),
                number: 1.0,
                title: "Chapter 1".to_string(),
                volume: None,
                release_date: None,
            }],
        }));
        app.move_selection_down(View::Details);
        assert_eq!(app.details_state.selected(), Some(0));
        app.move_selection_up(View::Details);
        assert_eq!(app.details_state.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_search_goes_to_session_provider() {
        let stub = Arc::new(StubFetch::new());
        let mut app = test_app(stub.clone());
        app.choose_content(ContentType::Manga);
        for c in "one piece".chars() {
            app.handle_search_input(KeyEvent::from(KeyCode::Char(c)));
        }
        app.handle_search_input(KeyEvent::from(KeyCode::Enter));
        assert!(app.loading);
        assert_eq!(app.last_query, "one piece");

        // A second Enter while loading starts nothing new.
        app.handle_search_input(KeyEvent::from(KeyCode::Enter));

        let msg = app.msg_rx.recv().await.unwrap();
        assert!(matches!(msg, AppMessage::Failed(1, _)));
        assert_eq!(
            stub.requested(),
            vec![format!("{}/one-piece", mangadex::DEFAULT_BASE_URL)]
        );
    }

    #[tokio::test]
    async fn test_leaving_search_waits_for_pending_request() {
        let stub = Arc::new(StubFetch::new());
        let mut app = test_app(stub.clone());
        app.choose_content(ContentType::Manga);
        app.search_query = "one".to_string();
        app.perform_search();

        app.handle_search_input(KeyEvent::from(KeyCode::Esc));
        app.choose_content(ContentType::Manga);
        app.search_query = "two".to_string();
        app.perform_search();
        assert!(app.loading);

        // The first reply is still owed; it clears the gate but is not shown.
        let first = app.msg_rx.recv().await.unwrap();
        assert!(matches!(first, AppMessage::Failed(1, _)));
        assert_eq!(
            stub.requested(),
            vec![format!("{}/one", mangadex::DEFAULT_BASE_URL)]
        );
        app.msg_tx.send(first).unwrap();
        app.process_messages();
        assert!(!app.loading);
        assert_eq!(app.status, None);

        app.perform_search();
        let second = app.msg_rx.recv().await.unwrap();
        assert!(matches!(second, AppMessage::Failed(2, _)));
        assert_eq!(
            stub.requested(),
            vec![
                format!("{}/one", mangadex::DEFAULT_BASE_URL),
                format!("{}/two", mangadex::DEFAULT_BASE_URL),
            ]
        );
    }

    #[test]
    fn test_splash_frame_grows() {
        assert_eq!(splash_frame(1).lines().count(), 6);
        assert!(splash_frame(1).lines().next().unwrap().len() < splash_frame(6).lines().next().unwrap().len());
    }
}
