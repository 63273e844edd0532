use crate::api::RecordStore;
use crate::app::{ActiveInput, App, InputMode, View};
use crate::header::Header;
use crate::models::{Event, EventStatus, Task};
use ansi_parser::{AnsiParser, Output};
use crossterm::event::{self, Event as CEvent};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

pub fn ansi_to_text(ansi_str: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for ansi_line in ansi_str.lines() {
        let mut spans = Vec::new();
        let parsed = ansi_line.ansi_parse();
        for item in parsed {
            match item {
                Output::TextBlock(text) => {
                    spans.push(Span::raw(text.to_string()));
                }
                Output::Escape(_escape) => {}
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

/// Rich-text descriptions arrive as HTML; plain ones are shown as they are.
pub fn description_lines(desc: &str, width: usize) -> Vec<Line<'static>> {
    let trimmed = desc.trim();
    if trimmed.is_empty() || trimmed == "<p></p>" {
        vec![Line::from(Span::raw("No description".to_string()))]
    } else if trimmed.starts_with('<') {
        let ansi_text = html2text::from_read(trimmed.as_bytes(), width.max(1));
        ansi_to_text(&ansi_text)
    } else {
        trimmed
            .lines()
            .map(|l| Line::from(Span::raw(l.to_string())))
            .collect()
    }
}

fn status_color(status: Option<&EventStatus>) -> Color {
    match status {
        Some(EventStatus::Planning) => Color::Blue,
        Some(EventStatus::InProgress) => Color::Yellow,
        Some(EventStatus::Completed) => Color::Green,
        Some(EventStatus::Cancelled) => Color::DarkGray,
        _ => Color::Gray,
    }
}

fn bold(label: &'static str) -> Span<'static> {
    Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
}

fn key_hint(key: &'static str, action: &'static str) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!(" {} ", key), Style::default().fg(Color::Red)),
        Span::raw(format!(": {} ", action)),
    ]
}

fn get_legend(app_mode: &InputMode, view: View) -> Text<'static> {
    let hints: Vec<(&'static str, &'static str)> = match app_mode {
        InputMode::Normal => {
            let mut hints = vec![("q", "Quit"), ("j/k", "Move"), ("m", "Menu"), ("1-3", "Views")];
            match view {
                View::Dashboard | View::Events => hints.extend([
                    ("Enter", "Open"),
                    ("a", "Add Event"),
                    ("s", "Status"),
                    ("d", "Delete"),
                ]),
                View::EventDetail => hints.extend([
                    ("a", "Add Task"),
                    ("x", "Done"),
                    ("s", "Status"),
                    ("d", "Delete Task"),
                    ("Esc", "Back"),
                ]),
                View::Tasks => hints.extend([
                    ("Enter", "Open Event"),
                    ("x", "Done"),
                    ("t", "Toggle Done"),
                    ("d", "Delete"),
                ]),
            }
            hints.push(("r", "Refresh"));
            hints
        }
        InputMode::Editing => vec![
            ("i", "Insert"),
            ("Tab", "Switch Field"),
            ("Enter", "Submit"),
            ("Esc", "Cancel"),
        ],
        InputMode::Insert => vec![("Esc", "Done Typing")],
        InputMode::ConfirmDelete | InputMode::ConfirmLogout => vec![("y", "Yes"), ("n", "No")],
    };

    let spans: Vec<Span<'static>> = hints
        .into_iter()
        .flat_map(|(key, action)| key_hint(key, action))
        .collect();
    Text::from(Line::from(spans))
}

fn event_item(event: &Event) -> ListItem<'static> {
    let status = event.status.as_ref();
    let label = status.map_or("-".to_string(), |s| s.to_string());
    let date = event.date.clone().unwrap_or_else(|| "no date".to_string());
    ListItem::new(Line::from(vec![
        Span::styled(
            format!("{:<12}", label),
            Style::default().fg(status_color(status)),
        ),
        Span::raw(format!("{}  ", date)),
        Span::raw(event.display_title().to_string()),
    ]))
}

fn task_item(task: &Task) -> ListItem<'static> {
    let check = if task.completed { "[x] " } else { "[ ] " };
    let due = task
        .due_date
        .as_deref()
        .map(|d| format!("  (due {})", d))
        .unwrap_or_default();
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!("  #{}", task.tags.join(" #"))
    };
    let title_style = if task.completed {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    ListItem::new(Line::from(vec![
        Span::styled(check, Style::default().fg(Color::Green)),
        Span::styled(task.display_title().to_string(), title_style),
        Span::raw(due),
        Span::styled(tags, Style::default().fg(Color::Yellow)),
    ]))
}

fn event_details(event: &Event, width: u16) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(vec![
        bold("Title: "),
        Span::raw(event.display_title().to_string()),
    ]));

    let date = event.date.clone().unwrap_or_else(|| "No date".to_string());
    lines.push(Line::from(vec![bold("Date: "), Span::raw(date)]));

    let status = event
        .status
        .as_ref()
        .map_or("No status".to_string(), |s| s.to_string());
    lines.push(Line::from(vec![
        bold("Status: "),
        Span::styled(status, Style::default().fg(status_color(event.status.as_ref()))),
    ]));

    let budget = event
        .budget
        .map_or("No budget".to_string(), |b| format!("{:.2}", b));
    lines.push(Line::from(vec![bold("Budget: "), Span::raw(budget)]));

    // tags
    lines.push(Line::from(vec![bold("Tags: ")]));
    if event.tags.is_empty() {
        lines.push(Line::from(Span::raw("No tags".to_string())));
    } else {
        let mut tag_spans: Vec<Span<'static>> = Vec::new();
        for (i, tag) in event.tags.iter().enumerate() {
            if i > 0 {
                tag_spans.push(Span::raw(" ".to_string()));
            }
            tag_spans.push(Span::styled(
                format!(" {} ", tag),
                Style::default().bg(Color::Yellow).fg(Color::Black),
            ));
        }
        lines.push(Line::from(tag_spans));
    }

    if let Some(owner) = &event.owner {
        let name = owner.name.clone().unwrap_or_else(|| owner.id.to_string());
        lines.push(Line::from(vec![bold("Owner: "), Span::raw(name)]));
    }
    if let Some(created_at) = &event.created_at {
        lines.push(Line::from(vec![bold("Created: "), Span::raw(created_at.clone())]));
    }
    if let Some(updated_at) = &event.updated_at {
        lines.push(Line::from(vec![bold("Updated: "), Span::raw(updated_at.clone())]));
    }

    // description
    lines.push(Line::from(vec![bold("Description: ")]));
    let width = width.saturating_sub(2) as usize;
    lines.extend(description_lines(
        event.description.as_deref().unwrap_or(""),
        width,
    ));

    lines
}

fn render_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem<'static>>,
    empty: &'static str,
    state: &mut ratatui::widgets::ListState,
) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if items.is_empty() {
        f.render_widget(List::new(vec![ListItem::new(empty)]).block(block), area);
    } else {
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, area, state);
    }
}

fn render_sidebar<S>(f: &mut Frame, area: Rect, app: &App<S>) {
    let items: Vec<ListItem> = View::MENU
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let current = *view == app.view || (app.view == View::EventDetail && *view == View::Events);
            let style = if current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(Color::Red)),
                Span::styled(view.title(), style),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Menu")),
        area,
    );
}

fn render_dashboard<S: RecordStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let stat = |label: &'static str, value: usize, color: Color| {
        vec![
            Span::raw(format!("{}: ", label)),
            Span::styled(
                value.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
        ]
    };
    let mut spans = Vec::new();
    spans.extend(stat("Total", app.stats.total_events, Color::White));
    spans.extend(stat("Upcoming", app.stats.upcoming_events, Color::Blue));
    spans.extend(stat("In Progress", app.stats.active_events, Color::Yellow));
    spans.extend(stat("Completed", app.stats.completed_events, Color::Green));
    f.render_widget(
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Overview")),
        chunks[0],
    );

    let items = app.upcoming.iter().map(event_item).collect();
    render_list(
        f,
        chunks[1],
        "Upcoming Events",
        items,
        "No upcoming events",
        &mut app.state,
    );
}

fn render_events<S: RecordStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let items = app.events.iter().map(event_item).collect();
    render_list(
        f,
        chunks[0],
        "Events",
        items,
        "No events available",
        &mut app.state,
    );

    let detail_block = Block::default().borders(Borders::ALL).title("Event Details");
    let paragraph = match app.highlighted_event() {
        Some(event) => Paragraph::new(event_details(event, chunks[1].width)),
        None => Paragraph::new("Select an event to see its details"),
    };
    f.render_widget(
        paragraph.block(detail_block).wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn render_event_detail<S: RecordStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let title = app
        .selected_event
        .as_ref()
        .map_or("Event".to_string(), |e| e.display_title().to_string());
    let details = match &app.selected_event {
        Some(event) => Paragraph::new(event_details(event, chunks[0].width)),
        None => Paragraph::new("Loading event..."),
    };
    f.render_widget(
        details
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let items = app.tasks.iter().map(task_item).collect();
    render_list(
        f,
        chunks[1],
        "Tasks",
        items,
        "No tasks for this event",
        &mut app.state,
    );
}

fn render_tasks<S: RecordStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let title = if app.show_done_tasks {
        "Tasks (All)"
    } else {
        "Tasks (Undone)"
    };
    let items = app.tasks.iter().map(task_item).collect();
    render_list(
        f,
        area,
        title,
        items,
        "No active tasks",
        &mut app.state,
    );
}

fn render_input_popup<S>(f: &mut Frame, area: Rect, app: &App<S>) {
    let popup_width_percentage = 60;
    let popup_width = (area.width * popup_width_percentage / 100).saturating_sub(2);

    let title_lines = calculate_wrapped_lines(&app.new_title, popup_width).max(1) as u16;
    let description_lines = calculate_wrapped_lines(&app.new_description, popup_width).max(1) as u16;

    let popup_height = std::cmp::min(title_lines + description_lines + 4, area.height);
    let popup_area = centered_rect_absolute(popup_width + 2, popup_height, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(title_lines + 2), Constraint::Min(0)].as_ref())
        .split(popup_area);

    let heading = if app.view == View::EventDetail {
        "New Task (title @due-date)"
    } else {
        "New Event (title @date $budget)"
    };
    let field_style = |field: ActiveInput| {
        let active = app.active_input == field;
        match (active, &app.input_mode) {
            (true, InputMode::Insert) => Style::default().fg(Color::Yellow),
            (true, _) => Style::default().fg(Color::Green),
            _ => Style::default().fg(Color::DarkGray),
        }
    };

    let title_input = Paragraph::new(app.new_title.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(heading)
                .borders(Borders::ALL)
                .border_style(field_style(ActiveInput::Title)),
        )
        .wrap(Wrap { trim: false });
    let description_input = Paragraph::new(app.new_description.as_str())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title("Description")
                .borders(Borders::ALL)
                .border_style(field_style(ActiveInput::Description)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(title_input, chunks[0]);
    f.render_widget(description_input, chunks[1]);
}

fn render_confirm(f: &mut Frame, area: Rect, question: &str) {
    let width = (question.chars().count() as u16 + 4).min(area.width);
    let popup_area = centered_rect_absolute(width, 3, area);
    let popup = Paragraph::new(question.to_string())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

pub fn draw<S: RecordStore>(f: &mut Frame, app: &mut App<S>) {
    let size = f.area();

    // Header, body, status line and legend
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    Header::new(&app.session, app.menu_open).render(f, chunks[0]);

    let body_chunk = if app.menu_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(20), Constraint::Min(0)].as_ref())
            .split(chunks[1]);
        render_sidebar(f, columns[0], app);
        columns[1]
    } else {
        chunks[1]
    };

    match app.view {
        View::Dashboard => render_dashboard(f, body_chunk, app),
        View::Events => render_events(f, body_chunk, app),
        View::EventDetail => render_event_detail(f, body_chunk, app),
        View::Tasks => render_tasks(f, body_chunk, app),
    }

    match app.input_mode {
        InputMode::Editing | InputMode::Insert => render_input_popup(f, body_chunk, app),
        InputMode::ConfirmDelete => render_confirm(f, body_chunk, "Delete this record? (y/n)"),
        InputMode::ConfirmLogout => {
            render_confirm(f, body_chunk, "Are you sure you want to logout? (y/n)")
        }
        InputMode::Normal => {}
    }

    if let Some(message) = &app.status_message {
        f.render_widget(
            Paragraph::new(message.as_str()).style(Style::default().fg(Color::Yellow)),
            chunks[2],
        );
    }

    // Render the legend in the footer
    let legend = Paragraph::new(get_legend(&app.input_mode, app.view))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(legend, chunks[3]);
}

pub async fn run_app<B: Backend, S: RecordStore>(
    terminal: &mut Terminal<B>,
    mut app: App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                let should_quit = app.handle_input(key).await;
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}

fn calculate_wrapped_lines(text: &str, max_width: u16) -> usize {
    let max_width = max_width.max(1) as usize;
    let mut line_count = 0;
    for line in text.lines() {
        let line_width = line.chars().count();
        line_count += line_width.div_ceil(max_width).max(1);
    }
    line_count
}
