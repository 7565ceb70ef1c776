mod models;
mod scheduler;
mod store;

pub use models::{Task, TaskFilter};
pub use scheduler::{free_intervals_in, suggest_slots, task_reference, TaskScheduler};
pub use store::{RedisTaskStore, TaskStore};
