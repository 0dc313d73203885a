//! Expense form handling.
//!
//! Holds the raw text of the add/edit expense form, performs the
//! required-field checks that gate submission, and turns a valid form into
//! a `/spend` request. Nothing here talks to the store.

use chrono::NaiveDate;
use shared::{parse_calendar_date, Event, EventFields, ExpenseCategory, SpendRequest};

/// Whether the form creates a new expense or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { event_id: String },
}

/// Reasons a form cannot be submitted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormValidationError {
    #[error("Please enter an expense name.")]
    MissingExpenseName,
    #[error("Please enter a cost amount.")]
    MissingCost,
    #[error("Cost cannot be negative.")]
    NegativeCost,
    #[error("Please enter a start date.")]
    MissingStartDate,
    #[error("Please enter an end date.")]
    MissingEndDate,
    #[error("'{0}' is not a valid date (expected YYYY-MM-DD).")]
    InvalidDate(String),
    #[error("End date cannot be before the start date.")]
    EndBeforeStart,
    #[error("Please enter a description.")]
    MissingDescription,
    #[error("Please enter your custom category name.")]
    MissingCustomReason,
}

/// Raw form inputs, exactly as typed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventForm {
    pub expense_name: String,
    pub cost: String,
    pub start_date: String,
    pub end_date: String,
    pub category: String,
    pub custom_reason: String,
    pub description: String,
}

impl EventForm {
    /// Blank form for a day cell: both dates set to that day, first category selected
    pub fn for_new(date: NaiveDate) -> Self {
        let iso = date.format("%Y-%m-%d").to_string();
        Self {
            start_date: iso.clone(),
            end_date: iso,
            category: ExpenseCategory::ALL[0].label().to_string(),
            ..Self::default()
        }
    }

    /// Form prefilled from an existing record
    pub fn for_event(event: &Event) -> Self {
        Self {
            expense_name: event.expense_name.clone(),
            cost: event.cost.to_string(),
            start_date: event.start_date.format("%Y-%m-%d").to_string(),
            end_date: event.end_date.format("%Y-%m-%d").to_string(),
            category: event.category.label().to_string(),
            custom_reason: event.custom_reason.clone().unwrap_or_default(),
            description: event.description.clone(),
        }
    }

    pub fn selected_category(&self) -> ExpenseCategory {
        if self.category.trim().is_empty() {
            ExpenseCategory::default()
        } else {
            ExpenseCategory::from_label(&self.category)
        }
    }

    /// Check every required field, collecting all problems at once
    pub fn validate(&self) -> Result<EventFields, Vec<FormValidationError>> {
        let mut errors = Vec::new();

        let expense_name = self.expense_name.trim();
        if expense_name.is_empty() {
            errors.push(FormValidationError::MissingExpenseName);
        }

        let cost = match self.cost.trim().parse::<f64>() {
            Ok(cost) if cost.is_finite() && cost < 0.0 => {
                errors.push(FormValidationError::NegativeCost);
                None
            }
            Ok(cost) if cost.is_finite() => Some(cost),
            _ => {
                errors.push(FormValidationError::MissingCost);
                None
            }
        };

        let start_date = Self::required_date(
            &self.start_date,
            FormValidationError::MissingStartDate,
            &mut errors,
        );
        let end_date = Self::required_date(
            &self.end_date,
            FormValidationError::MissingEndDate,
            &mut errors,
        );
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.push(FormValidationError::EndBeforeStart);
            }
        }

        let category = self.selected_category();
        let custom_reason = if category == ExpenseCategory::Custom {
            let reason = self.custom_reason.trim();
            if reason.is_empty() {
                errors.push(FormValidationError::MissingCustomReason);
            }
            Some(reason.to_string())
        } else {
            None
        };

        let description = self.description.trim();
        if description.is_empty() {
            errors.push(FormValidationError::MissingDescription);
        }

        match (cost, start_date, end_date) {
            (Some(cost), Some(start_date), Some(end_date)) if errors.is_empty() => Ok(EventFields {
                expense_name: expense_name.to_string(),
                start_date,
                end_date,
                description: description.to_string(),
                category,
                cost,
                custom_reason,
            }),
            _ => Err(errors),
        }
    }

    /// Build the `/spend` request for this form
    pub fn to_request(&self, mode: &FormMode) -> Result<SpendRequest, Vec<FormValidationError>> {
        let fields = self.validate()?;
        Ok(match mode {
            FormMode::Add => SpendRequest::add(fields),
            FormMode::Edit { event_id } => SpendRequest::update(event_id.clone(), fields),
        })
    }

    fn required_date(
        input: &str,
        missing: FormValidationError,
        errors: &mut Vec<FormValidationError>,
    ) -> Option<NaiveDate> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            errors.push(missing);
            return None;
        }
        let parsed = parse_calendar_date(trimmed);
        if parsed.is_none() {
            errors.push(FormValidationError::InvalidDate(trimmed.to_string()));
        }
        parsed
    }
}

/// Message for the first validation error, as shown to the user
pub fn first_error_message(errors: &[FormValidationError]) -> Option<String> {
    errors.first().map(|e| e.to_string())
}
