use crate::api::RecordStore;
use crate::error::ServiceError;
use crate::models::{Event, EventPatch, EventStats, NewEvent, NewTask, Task, TaskPatch};
use crate::parser::parse_quick_add;
use crate::services::{EventService, TaskService};
use crate::session::{Logout, Session};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Events,
    EventDetail,
    Tasks,
}

impl View {
    /// Views reachable from the navigation menu.
    pub const MENU: [View; 3] = [View::Dashboard, View::Events, View::Tasks];

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Events => "Events",
            View::EventDetail => "Event",
            View::Tasks => "Active Tasks",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Insert,
    ConfirmDelete,
    ConfirmLogout,
}

#[derive(Debug, PartialEq)]
pub enum ActiveInput {
    Title,
    Description,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeleteTarget {
    Event(i64),
    Task(i64),
}

pub struct App<S> {
    events_service: EventService<S>,
    tasks_service: TaskService<S>,
    logout: Box<dyn Logout>,
    pub session: Session,
    pub menu_open: bool,
    pub view: View,
    pub stats: EventStats,
    pub upcoming: Vec<Event>,
    pub events: Vec<Event>,
    pub tasks: Vec<Task>,
    pub selected_event: Option<Event>,
    pub show_done_tasks: bool,
    pub state: ListState,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub new_title: String,
    pub new_description: String,
    pub pending_delete: Option<DeleteTarget>,
    pub status_message: Option<String>,
}

impl<S: RecordStore + Clone> App<S> {
    pub fn new(store: S, session: Session, logout: Box<dyn Logout>) -> App<S> {
        App {
            events_service: EventService::new(store.clone()),
            tasks_service: TaskService::new(store),
            logout,
            session,
            menu_open: false,
            view: View::Dashboard,
            stats: EventStats::default(),
            upcoming: Vec::new(),
            events: Vec::new(),
            tasks: Vec::new(),
            selected_event: None,
            show_done_tasks: false,
            state: ListState::default(),
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
            new_title: String::new(),
            new_description: String::new(),
            pending_delete: None,
            status_message: None,
        }
    }
}

impl<S: RecordStore> App<S> {
    /// Logs a failed call and falls back to the empty value so the screen stays usable.
    fn or_default<T: Default>(&mut self, result: Result<T, ServiceError>, what: &str) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                log::error!("Error {}: {}", what, err);
                self.status_message = Some(format!("Error {}: {}", what, err));
                T::default()
            }
        }
    }

    pub async fn refresh(&mut self) {
        match self.view {
            View::Dashboard => {
                let stats = self.events_service.stats().await;
                self.stats = self.or_default(stats, "fetching event stats");
                let upcoming = self.events_service.upcoming().await;
                self.upcoming = self.or_default(upcoming, "fetching upcoming events");
            }
            View::Events => {
                let events = self.events_service.list_all().await;
                self.events = self.or_default(events, "fetching events");
            }
            View::EventDetail => {
                if let Some(id) = self.selected_event.as_ref().map(|e| e.id) {
                    self.load_event(id).await;
                }
            }
            View::Tasks => {
                let tasks = if self.show_done_tasks {
                    self.tasks_service.list_all().await
                } else {
                    self.tasks_service.active().await
                };
                self.tasks = self.or_default(tasks, "fetching tasks");
            }
        }
        self.clamp_selection();
    }

    async fn load_event(&mut self, id: i64) {
        match self.events_service.get_by_id(id).await {
            Ok(event) => {
                self.selected_event = Some(event);
                let tasks = self.tasks_service.by_event(id).await;
                self.tasks = self.or_default(tasks, "fetching tasks by event");
            }
            Err(err) if err.is_not_found() => {
                self.status_message = Some(format!("Event {} no longer exists", id));
                self.selected_event = None;
                self.view = View::Events;
                let events = self.events_service.list_all().await;
                self.events = self.or_default(events, "fetching events");
            }
            Err(err) => {
                self.or_default::<()>(Err(err), "fetching event");
            }
        }
    }

    pub async fn switch_view(&mut self, view: View) {
        self.view = view;
        self.state.select(Some(0));
        self.refresh().await;
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn list_len(&self) -> usize {
        match self.view {
            View::Dashboard => self.upcoming.len(),
            View::Events => self.events.len(),
            View::EventDetail | View::Tasks => self.tasks.len(),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.list_len();
        if len == 0 {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(i));
        }
    }

    pub fn next(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn highlighted_event(&self) -> Option<&Event> {
        match self.view {
            View::Dashboard => self.upcoming.get(self.state.selected()?),
            View::Events => self.events.get(self.state.selected()?),
            View::EventDetail => self.selected_event.as_ref(),
            View::Tasks => None,
        }
    }

    pub fn highlighted_task(&self) -> Option<&Task> {
        match self.view {
            View::EventDetail | View::Tasks => self.tasks.get(self.state.selected()?),
            _ => None,
        }
    }

    pub async fn open_event(&mut self) {
        let id = match self.view {
            View::Tasks => self.highlighted_task().and_then(|t| t.event_id),
            _ => self.highlighted_event().map(|e| e.id),
        };
        if let Some(id) = id {
            self.view = View::EventDetail;
            self.selected_event = None;
            self.tasks.clear();
            self.load_event(id).await;
            self.state.select(Some(0));
            self.clamp_selection();
        }
    }

    pub async fn cycle_event_status(&mut self) {
        let Some(event) = self.highlighted_event() else {
            return;
        };
        let id = event.id;
        let patch = EventPatch {
            status: Some(event.status.clone().unwrap_or_default().cycle()),
            ..Default::default()
        };
        let result = self.events_service.update(id, &patch).await;
        if let Some(event) = self.or_default(result.map(Some), "updating event") {
            self.status_message = Some(format!(
                "{} is now {}",
                event.display_title(),
                patch_status(&patch)
            ));
        }
        self.refresh().await;
    }

    /// Flips completion based on a fresh read of the task.
    pub async fn toggle_task(&mut self) {
        let Some(id) = self.highlighted_task().map(|t| t.id) else {
            return;
        };
        let current = match self.tasks_service.get_by_id(id).await {
            Ok(task) => task,
            Err(err) => {
                self.or_default::<()>(Err(err), "fetching task");
                self.refresh().await;
                return;
            }
        };
        let patch = TaskPatch {
            completed: Some(!current.completed),
            ..Default::default()
        };
        let result = self.tasks_service.update(id, &patch).await;
        self.or_default(result.map(Some), "updating task");
        self.refresh().await;
    }

    pub fn request_delete(&mut self) {
        let target = match self.view {
            View::EventDetail | View::Tasks => self.highlighted_task().map(|t| DeleteTarget::Task(t.id)),
            View::Dashboard | View::Events => {
                self.highlighted_event().map(|e| DeleteTarget::Event(e.id))
            }
        };
        if target.is_some() {
            self.pending_delete = target;
            self.input_mode = InputMode::ConfirmDelete;
        }
    }

    async fn confirm_delete(&mut self) {
        let result = match self.pending_delete.take() {
            Some(DeleteTarget::Event(id)) => self.events_service.delete(id).await,
            Some(DeleteTarget::Task(id)) => self.tasks_service.delete(id).await,
            None => return,
        };
        if let Some(deleted) = self.or_default(result.map(Some), "deleting record") {
            self.status_message = Some(if deleted {
                "Deleted".to_string()
            } else {
                "Nothing was deleted".to_string()
            });
        }
        self.refresh().await;
    }

    /// Asks for confirmation first; only an authenticated session can log out.
    pub fn request_logout(&mut self) {
        if self.session.is_authenticated {
            self.input_mode = InputMode::ConfirmLogout;
        }
    }

    async fn confirm_logout(&mut self) -> bool {
        match self.logout.logout().await {
            Ok(()) => {
                self.session = Session::signed_out();
                true
            }
            Err(err) => {
                self.or_default::<()>(Err(err), "logging out");
                false
            }
        }
    }

    fn start_editing(&mut self) {
        self.input_mode = InputMode::Editing;
        self.new_title.clear();
        self.new_description.clear();
        self.active_input = ActiveInput::Title;
    }

    fn stop_editing(&mut self) {
        self.new_title.clear();
        self.new_description.clear();
        self.input_mode = InputMode::Normal;
    }

    async fn submit(&mut self) {
        if self.new_title.trim().is_empty() {
            self.status_message = Some("Title cannot be empty.".to_string());
            return;
        }
        let parsed = parse_quick_add(&self.new_title);
        let Some(date) = parsed.date else {
            self.status_message = Some("Add a date with @YYYY-MM-DD".to_string());
            return;
        };
        let description = self.new_description.trim().to_string();

        let event_id = self.selected_event.as_ref().map(|e| e.id);

        match (self.view, event_id) {
            (View::EventDetail, Some(event_id)) => {
                let task = NewTask {
                    title: parsed.title,
                    description,
                    due_date: date,
                    event_id,
                };
                let result = self.tasks_service.create(&task).await;
                self.or_default(result.map(Some), "creating task");
            }
            (View::EventDetail, None) => {
                self.status_message = Some("Event not loaded".to_string());
                return;
            }
            (View::Dashboard | View::Events, _) => {
                let event = NewEvent {
                    title: parsed.title,
                    date,
                    description,
                    budget: parsed.budget.unwrap_or(0.0),
                    status: None,
                };
                let result = self.events_service.create(&event).await;
                self.or_default(result.map(Some), "creating event");
            }
            (View::Tasks, _) => {}
        }
        self.stop_editing();
        self.refresh().await;
    }

    /// Returns `true` when the application should quit.
    pub async fn handle_input(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char('m') => self.toggle_menu(),
                KeyCode::Char('1') => self.switch_view(View::Dashboard).await,
                KeyCode::Char('2') => self.switch_view(View::Events).await,
                KeyCode::Char('3') => self.switch_view(View::Tasks).await,
                KeyCode::Char('r') => {
                    self.status_message = None;
                    self.refresh().await;
                }
                KeyCode::Char('a') => match self.view {
                    View::Tasks => {
                        self.status_message =
                            Some("Open an event to add tasks to it".to_string())
                    }
                    _ => self.start_editing(),
                },
                KeyCode::Char('s') => self.cycle_event_status().await,
                KeyCode::Char('x') => self.toggle_task().await,
                KeyCode::Char('t') => {
                    if self.view == View::Tasks {
                        self.show_done_tasks = !self.show_done_tasks;
                        self.refresh().await;
                    }
                }
                KeyCode::Char('d') => self.request_delete(),
                KeyCode::Char('L') => self.request_logout(),
                KeyCode::Enter => {
                    if self.view != View::EventDetail {
                        self.open_event().await;
                    }
                }
                KeyCode::Esc | KeyCode::Backspace => {
                    if self.view == View::EventDetail {
                        self.switch_view(View::Events).await;
                    }
                }
                _ => {}
            },

            InputMode::Editing => match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Insert;
                }
                KeyCode::Tab => {
                    self.active_input = match self.active_input {
                        ActiveInput::Title => ActiveInput::Description,
                        ActiveInput::Description => ActiveInput::Title,
                    };
                }
                KeyCode::Enter => self.submit().await,
                KeyCode::Esc => self.stop_editing(),
                _ => {}
            },

            InputMode::Insert => match key.code {
                KeyCode::Char(c) => match self.active_input {
                    ActiveInput::Title => self.new_title.push(c),
                    ActiveInput::Description => self.new_description.push(c),
                },
                KeyCode::Backspace => match self.active_input {
                    ActiveInput::Title => {
                        self.new_title.pop();
                    }
                    ActiveInput::Description => {
                        self.new_description.pop();
                    }
                },
                KeyCode::Esc => {
                    self.input_mode = InputMode::Editing;
                }
                _ => {}
            },

            InputMode::ConfirmDelete => match key.code {
                KeyCode::Char('y') => {
                    self.input_mode = InputMode::Normal;
                    self.confirm_delete().await;
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.pending_delete = None;
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },

            InputMode::ConfirmLogout => match key.code {
                KeyCode::Char('y') => {
                    self.input_mode = InputMode::Normal;
                    return self.confirm_logout().await;
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
        }
        false
    }
}

fn patch_status(patch: &EventPatch) -> &str {
    patch.status.as_ref().map_or("", |s| s.as_str())
}
