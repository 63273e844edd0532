use crate::session::Session;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub const TITLE: &str = "EventPro";

/// Page header: menu toggle, product title and account controls.
///
/// Everything it shows comes from the injected session snapshot; the logout
/// action itself lives with the caller (see [`crate::app::App::request_logout`]).
pub struct Header<'a> {
    pub session: &'a Session,
    pub menu_open: bool,
}

impl<'a> Header<'a> {
    pub fn new(session: &'a Session, menu_open: bool) -> Self {
        Header { session, menu_open }
    }

    pub fn title_line(&self) -> Line<'static> {
        let menu = if self.menu_open { " ✕ " } else { " ☰ " };
        Line::from(vec![
            Span::styled(menu, Style::default().fg(Color::Red)),
            Span::raw(" "),
            Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD)),
        ])
    }

    /// Empty unless the session is authenticated with a user.
    pub fn account_line(&self) -> Line<'static> {
        match self.session.greeting() {
            Some(greeting) => Line::from(vec![
                Span::styled(greeting, Style::default().fg(Color::Gray)),
                Span::raw("  🔔  ⚙  "),
                Span::styled(" L ", Style::default().fg(Color::Red)),
                Span::raw(": Logout "),
            ]),
            None => Line::default(),
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::BOTTOM);
        let inner = block.inner(area);
        f.render_widget(block, area);

        f.render_widget(
            Paragraph::new(self.title_line()).alignment(Alignment::Left),
            inner,
        );
        f.render_widget(
            Paragraph::new(self.account_line()).alignment(Alignment::Right),
            inner,
        );
    }
}
