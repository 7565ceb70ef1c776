use super::models::{Expense, Month};
use std::collections::BTreeMap;
use std::fmt;

/// Spending totals for one month
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    pub month: Month,
    pub by_category: BTreeMap<String, f64>,
    pub total: f64,
}

/// Sum the expenses of `month` per category
pub fn summarize_expenses(expenses: &[Expense], month: Month) -> ExpenseSummary {
    let by_category = expenses
        .iter()
        .filter(|expense| month.contains(expense.spent_on))
        .fold(BTreeMap::new(), |mut totals, expense| {
            *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
            totals
        });
    let total = by_category.values().sum();

    ExpenseSummary {
        month,
        by_category,
        total,
    }
}

impl fmt::Display for ExpenseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Expenses for {}", self.month)?;
        for (category, amount) in &self.by_category {
            writeln!(f, "  {:<16} {:>10.2}", category, amount)?;
        }
        write!(f, "  {:<16} {:>10.2}", "total", self.total)
    }
}
