use super::{CommandContext, CommandResult};
use chrono::NaiveDate;
use clap::Subcommand;
use lifedesk::components::journal::{Expense, Idea, Month};
use lifedesk::error::validation_error;

#[derive(Subcommand)]
pub enum IdeaAction {
    /// Write down an idea
    Add {
        /// Idea title
        title: String,
        /// Longer description
        #[arg(long)]
        body: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// List ideas, newest first
    List {
        /// Only ideas with this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Delete an idea
    Remove {
        /// Idea ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ExpenseAction {
    /// Record an expense
    Add {
        /// Amount spent
        amount: f64,
        /// Category, e.g. food or rent
        category: String,
        /// Day of the purchase (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },
    /// List expenses
    List {
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Delete an expense
    Remove {
        /// Expense ID
        id: String,
    },
    /// Per-category totals for a month
    Summary {
        /// Month to summarize (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
}

pub async fn run_idea(ctx: &CommandContext, action: IdeaAction) -> CommandResult {
    let journal = ctx.journal();
    match action {
        IdeaAction::Add { title, body, tags } => {
            let tags = tags.unwrap_or_default();
            let idea = Idea::new(title, body, tags.split(','), ctx.now().await?)?;
            journal.add_idea(&idea).await?;
            println!("Saved idea {}", idea.id);
        }
        IdeaAction::List { tag } => {
            let ideas = journal.list_ideas(tag.as_deref()).await?;
            if ideas.is_empty() {
                println!("No ideas yet");
            }
            for idea in ideas {
                let tags = if idea.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", idea.tags.join(", "))
                };
                println!(
                    "{}  {}  {}{}",
                    idea.id,
                    idea.created_at.format("%Y-%m-%d"),
                    idea.title,
                    tags
                );
                if let Some(body) = &idea.body {
                    println!("    {}", body);
                }
            }
        }
        IdeaAction::Remove { id } => {
            journal.remove_idea(&id).await?;
            println!("Removed idea {}", id);
        }
    }
    Ok(())
}

pub async fn run_expense(ctx: &CommandContext, action: ExpenseAction) -> CommandResult {
    let journal = ctx.journal();
    match action {
        ExpenseAction::Add {
            amount,
            category,
            date,
            note,
        } => {
            let spent_on = match date {
                Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| validation_error(&format!("Invalid date '{}': {}", raw, e)))?,
                None => ctx.now().await?.date_naive(),
            };
            let expense = Expense::new(amount, &category, spent_on, note)?;
            journal.add_expense(&expense).await?;
            println!("Recorded expense {}", expense.id);
        }
        ExpenseAction::List { month } => {
            let month = month.as_deref().map(str::parse::<Month>).transpose()?;
            let expenses = journal.list_expenses(month).await?;
            if expenses.is_empty() {
                println!("No expenses");
            }
            for expense in expenses {
                println!(
                    "{}  {}  {:<16} {:>10.2}  {}",
                    expense.id,
                    expense.spent_on,
                    expense.category,
                    expense.amount,
                    expense.note.as_deref().unwrap_or("")
                );
            }
        }
        ExpenseAction::Remove { id } => {
            journal.remove_expense(&id).await?;
            println!("Removed expense {}", id);
        }
        ExpenseAction::Summary { month } => {
            let month = match month {
                Some(raw) => raw.parse::<Month>()?,
                None => Month::of(ctx.now().await?.date_naive()),
            };
            println!("{}", journal.summarize(month).await?);
        }
    }
    Ok(())
}
