pub mod batch;
pub mod events;
pub mod tasks;

pub use events::EventService;
pub use tasks::TaskService;
