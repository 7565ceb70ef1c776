//! Personal journal: ideas and day-to-day expenses.

mod models;
mod store;
mod summary;

pub use models::{normalize_tags, Expense, Idea, Month};
pub use store::Journal;
pub use summary::{summarize_expenses, ExpenseSummary};
