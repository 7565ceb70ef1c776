use crate::error::{validation_error, DeskResult, Error};
use crate::utils::validate_id;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A captured idea with free-form tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IdeaRecord")]
pub struct Idea {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Deserialize)]
struct IdeaRecord {
    id: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    created_at: DateTime<FixedOffset>,
}

impl TryFrom<IdeaRecord> for Idea {
    type Error = Error;

    fn try_from(record: IdeaRecord) -> Result<Self, Self::Error> {
        let idea = Idea {
            id: record.id,
            title: record.title,
            body: record.body,
            tags: record.tags,
            created_at: record.created_at,
        };
        idea.validate()?;
        Ok(idea)
    }
}

/// Lower-case, trim and de-duplicate tags, keeping first-seen order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

impl Idea {
    pub fn new<I, S>(
        title: impl Into<String>,
        body: Option<String>,
        tags: I,
        created_at: DateTime<FixedOffset>,
    ) -> DeskResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let idea = Self {
            id: Uuid::new_v4().to_string(),
            title: title.into().trim().to_string(),
            body: body.filter(|b| !b.trim().is_empty()),
            tags: normalize_tags(tags),
            created_at,
        };
        idea.validate()?;
        Ok(idea)
    }

    pub fn validate(&self) -> DeskResult<()> {
        validate_id("idea", &self.id)?;
        if self.title.trim().is_empty() {
            return Err(validation_error("Idea title must not be empty"));
        }
        if self.tags != normalize_tags(&self.tags) {
            return Err(validation_error(&format!(
                "Idea {} has tags that are not lower-case and unique",
                self.id
            )));
        }
        Ok(())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        self.tags.iter().any(|t| *t == tag)
    }
}

/// A calendar month such as `2024-06`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> DeskResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(validation_error(&format!("Invalid month: {}", month)));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || validation_error(&format!("Invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Month::new(year, month)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Money spent on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord")]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub category: String,
    pub spent_on: NaiveDate,
    pub note: Option<String>,
}

#[derive(Deserialize)]
struct ExpenseRecord {
    id: String,
    amount: f64,
    category: String,
    spent_on: NaiveDate,
    #[serde(default)]
    note: Option<String>,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = Error;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        let expense = Expense {
            id: record.id,
            amount: record.amount,
            category: record.category,
            spent_on: record.spent_on,
            note: record.note,
        };
        expense.validate()?;
        Ok(expense)
    }
}

impl Expense {
    pub fn new(
        amount: f64,
        category: &str,
        spent_on: NaiveDate,
        note: Option<String>,
    ) -> DeskResult<Self> {
        let expense = Self {
            id: Uuid::new_v4().to_string(),
            amount,
            category: category.trim().to_lowercase(),
            spent_on,
            note: note.filter(|n| !n.trim().is_empty()),
        };
        expense.validate()?;
        Ok(expense)
    }

    pub fn validate(&self) -> DeskResult<()> {
        validate_id("expense", &self.id)?;
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(validation_error(&format!(
                "Expense amount must be positive, got {}",
                self.amount
            )));
        }
        if self.category.trim().is_empty() {
            return Err(validation_error("Expense category must not be empty"));
        }
        if self.category != self.category.trim().to_lowercase() {
            return Err(validation_error(&format!(
                "Expense category '{}' must be lower-case",
                self.category
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 3, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn idea_tags_are_normalized() {
        let idea = Idea::new("Garden shed", None, ["DIY", " diy", "", "Outdoors"], created()).unwrap();
        assert_eq!(idea.tags, vec!["diy", "outdoors"]);
        assert!(idea.has_tag("Outdoors"));
        assert!(!idea.has_tag("indoors"));
        assert!(Idea::new("  ", None, Vec::<String>::new(), created()).is_err());
    }

    #[test]
    fn stored_idea_with_bad_tags_is_rejected() {
        let json = r#"{"id":"i1","title":"x","tags":["Loud"],"created_at":"2024-06-03T12:00:00+03:00"}"#;
        assert!(serde_json::from_str::<Idea>(json).is_err());
    }

    #[test]
    fn months_parse_and_display() {
        let month: Month = "2024-6".parse().unwrap();
        assert_eq!(month.to_string(), "2024-06");
        assert!(month.contains(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
        assert!("2024-13".parse::<Month>().is_err());
        assert!("June".parse::<Month>().is_err());
    }

    #[test]
    fn expense_validation() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let expense = Expense::new(12.5, " Food ", day, Some(String::new())).unwrap();
        assert_eq!(expense.category, "food");
        assert!(expense.note.is_none());

        assert!(Expense::new(0.0, "food", day, None).is_err());
        assert!(Expense::new(f64::INFINITY, "food", day, None).is_err());
        assert!(Expense::new(3.0, " ", day, None).is_err());
    }
}
