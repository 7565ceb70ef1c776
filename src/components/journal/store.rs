use super::models::{Expense, Idea, Month};
use super::summary::{summarize_expenses, ExpenseSummary};
use crate::components::redis_service::{keys, RedisActorHandle, RedisCollection};
use crate::error::{not_found, DeskResult};
use crate::utils::validate_id;
use tracing::debug;

/// Ideas and expenses kept in Redis
pub struct Journal {
    ideas: RedisCollection<Idea>,
    expenses: RedisCollection<Expense>,
}

impl Journal {
    pub fn new(redis: RedisActorHandle) -> Self {
        Self {
            ideas: RedisCollection::new(redis.clone(), keys::IDEAS),
            expenses: RedisCollection::new(redis, keys::EXPENSES),
        }
    }

    pub async fn add_idea(&self, idea: &Idea) -> DeskResult<()> {
        idea.validate()?;
        self.ideas.put(&idea.id, idea).await?;
        debug!("Stored idea {}", idea.id);
        Ok(())
    }

    /// Ideas newest first, optionally only those carrying `tag`
    pub async fn list_ideas(&self, tag: Option<&str>) -> DeskResult<Vec<Idea>> {
        let mut ideas: Vec<Idea> = self
            .ideas
            .all()
            .await?
            .into_iter()
            .filter(|idea| tag.map_or(true, |t| idea.has_tag(t)))
            .collect();
        ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ideas)
    }

    pub async fn remove_idea(&self, id: &str) -> DeskResult<()> {
        validate_id("idea", id)?;
        if self.ideas.remove(id).await? {
            Ok(())
        } else {
            Err(not_found("idea", id))
        }
    }

    pub async fn add_expense(&self, expense: &Expense) -> DeskResult<()> {
        expense.validate()?;
        self.expenses.put(&expense.id, expense).await?;
        debug!("Stored expense {}", expense.id);
        Ok(())
    }

    /// Expenses by date, optionally limited to one month
    pub async fn list_expenses(&self, month: Option<Month>) -> DeskResult<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .all()
            .await?
            .into_iter()
            .filter(|expense| month.map_or(true, |m| m.contains(expense.spent_on)))
            .collect();
        expenses.sort_by(|a, b| a.spent_on.cmp(&b.spent_on).then_with(|| a.category.cmp(&b.category)));
        Ok(expenses)
    }

    pub async fn remove_expense(&self, id: &str) -> DeskResult<()> {
        validate_id("expense", id)?;
        if self.expenses.remove(id).await? {
            Ok(())
        } else {
            Err(not_found("expense", id))
        }
    }

    pub async fn summarize(&self, month: Month) -> DeskResult<ExpenseSummary> {
        let expenses = self.list_expenses(Some(month)).await?;
        Ok(summarize_expenses(&expenses, month))
    }
}
