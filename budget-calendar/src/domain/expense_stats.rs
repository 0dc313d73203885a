//! Expense statistics for the side panel.
//!
//! Aggregation works in two modes. Bare amounts (plain numbers, or raw JSON
//! values) feed the running total; categorized records (`Event`s, or JSON
//! objects carrying a `category`) also feed the per-category breakdown. Both
//! go through the same single-pass `aggregate`.

use serde_json::Value;
use shared::{coerce_amount, AggregateStats, CategoryShare, Event, ALL_CATEGORIES_KEY};
use std::cmp::Ordering;
use tracing::debug;

/// Something that can be counted as an expense.
///
/// `amount` must never return a non-finite number; values that cannot be
/// read as a cost count as 0.
pub trait ExpenseAmount {
    fn amount(&self) -> f64;

    /// Category to group this amount under, if it has one
    fn category(&self) -> Option<&str> {
        None
    }
}

fn finite_or_zero(amount: f64) -> f64 {
    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

impl ExpenseAmount for f64 {
    fn amount(&self) -> f64 {
        finite_or_zero(*self)
    }
}

impl ExpenseAmount for Option<f64> {
    fn amount(&self) -> f64 {
        self.map(finite_or_zero).unwrap_or(0.0)
    }
}

impl ExpenseAmount for Value {
    fn amount(&self) -> f64 {
        match self {
            Value::Object(fields) => fields
                .get("cost")
                .or_else(|| fields.get("amount"))
                .map(coerce_amount)
                .unwrap_or(0.0),
            other => coerce_amount(other),
        }
    }

    fn category(&self) -> Option<&str> {
        self.get("category").and_then(Value::as_str)
    }
}

impl ExpenseAmount for Event {
    fn amount(&self) -> f64 {
        finite_or_zero(self.cost)
    }

    fn category(&self) -> Option<&str> {
        Some(self.category_label())
    }
}

impl<T: ExpenseAmount + ?Sized> ExpenseAmount for &T {
    fn amount(&self) -> f64 {
        (**self).amount()
    }

    fn category(&self) -> Option<&str> {
        (**self).category()
    }
}

/// Computes totals, the largest payment and the category breakdown
#[derive(Debug, Clone)]
pub struct ExpenseStatsService {
    currency_symbol: String,
}

impl ExpenseStatsService {
    pub fn new() -> Self {
        Self {
            currency_symbol: "$".to_string(),
        }
    }

    pub fn with_currency_symbol(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Aggregate any sequence of expense values in a single pass
    pub fn aggregate<I>(&self, values: I) -> AggregateStats
    where
        I: IntoIterator,
        I::Item: ExpenseAmount,
    {
        let mut stats = AggregateStats::default();
        let mut count = 0usize;

        for value in values {
            let amount = value.amount();
            stats.total_amount += amount;
            stats.max_payment = stats.max_payment.max(amount);
            if let Some(category) = value.category() {
                *stats
                    .category_totals
                    .entry(category.to_string())
                    .or_insert(0.0) += amount;
            }
            count += 1;
        }

        debug!(
            "Aggregated {} expenses: total {:.2}, max {:.2}, {} categories",
            count,
            stats.total_amount,
            stats.max_payment,
            stats.category_totals.len()
        );
        stats
    }

    /// Running-total mode: bare amounts, no category grouping
    pub fn aggregate_amounts(&self, amounts: &[f64]) -> AggregateStats {
        self.aggregate(amounts)
    }

    /// Breakdown mode: events grouped by their category label
    pub fn aggregate_events(&self, events: &[Event]) -> AggregateStats {
        self.aggregate(events)
    }

    /// Fraction of the total spent in `category`; 0 when nothing was spent
    pub fn share(&self, stats: &AggregateStats, category: &str) -> f64 {
        if stats.total_amount == 0.0 {
            return 0.0;
        }
        stats
            .category_totals
            .get(category)
            .map(|amount| amount / stats.total_amount)
            .unwrap_or(0.0)
    }

    /// Category rows, highest amount first
    pub fn breakdown(&self, stats: &AggregateStats) -> Vec<CategoryShare> {
        let mut rows: Vec<CategoryShare> = stats
            .category_totals
            .iter()
            .map(|(category, amount)| CategoryShare {
                category: category.clone(),
                amount: *amount,
                share: self.share(stats, category),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.amount
                .partial_cmp(&a.amount)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.category.cmp(&b.category))
        });
        rows
    }

    /// Total of all event costs with two decimals, e.g. "119.75"
    pub fn running_total(&self, events: &[Event]) -> String {
        format!("{:.2}", self.aggregate(events.iter().map(|e| e.cost)).total_amount)
    }

    /// Format amount for display
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }

    /// Format a share as a percentage, e.g. "16.49%"
    pub fn format_share(&self, share: f64) -> String {
        format!("{:.2}%", share * 100.0)
    }

    /// Whether a breakdown has anything worth listing beyond the `"all"` row
    pub fn has_categories(&self, stats: &AggregateStats) -> bool {
        stats
            .category_totals
            .keys()
            .any(|category| category != ALL_CATEGORIES_KEY)
    }
}

impl Default for ExpenseStatsService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use shared::ExpenseCategory;

    fn create_test_event(id: &str, cost: f64, category: ExpenseCategory) -> Event {
        let day = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        Event {
            id: id.to_string(),
            expense_name: format!("Expense {}", id),
            start_date: day,
            end_date: day,
            date: None,
            cost,
            category,
            custom_reason: None,
            description: String::new(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    #[test]
    fn test_empty_input() {
        let service = ExpenseStatsService::new();
        let stats = service.aggregate_amounts(&[]);

        assert_eq!(stats.total_amount, 0.0);
        assert_eq!(stats.max_payment, 0.0);
        assert_eq!(stats.category_totals.len(), 1);
        assert_eq!(stats.category_totals.get("all"), Some(&0.0));
    }

    #[test]
    fn test_bare_amounts() {
        let service = ExpenseStatsService::new();
        let stats = service.aggregate_amounts(&[10.0, 20.0, 30.0]);

        assert_eq!(stats.total_amount, 60.0);
        assert_eq!(stats.max_payment, 30.0);
        assert_eq!(stats.category_totals.get("all"), Some(&0.0));
        assert!(!service.has_categories(&stats));
    }

    #[test]
    fn test_categorized_events() {
        let service = ExpenseStatsService::new();
        let events = vec![
            create_test_event("1", 12.50, ExpenseCategory::Food),
            create_test_event("2", 7.25, ExpenseCategory::Food),
            create_test_event("3", 100.00, ExpenseCategory::Housing),
        ];

        let stats = service.aggregate_events(&events);
        assert_close(stats.total_amount, 119.75);
        assert_close(stats.max_payment, 100.0);
        assert_eq!(stats.category_totals.len(), 3);
        assert_close(stats.category_totals["Food"], 19.75);
        assert_close(stats.category_totals["Housing"], 100.0);
        assert_eq!(stats.category_totals["all"], 0.0);
    }

    #[test]
    fn test_coercion_of_raw_values() {
        let service = ExpenseStatsService::new();
        let values = vec![
            json!(10),
            json!("5.5"),
            json!("lunch"),
            json!(null),
            json!({"cost": "4", "category": "Groceries"}),
            json!({"amount": 2, "category": "all"}),
        ];

        let stats = service.aggregate(&values);
        assert_close(stats.total_amount, 21.5);
        assert_close(stats.max_payment, 10.0);
        assert_close(stats.category_totals["Groceries"], 4.0);
        assert_close(stats.category_totals["all"], 2.0);
    }

    #[test]
    fn test_missing_and_non_finite_amounts_count_as_zero() {
        let service = ExpenseStatsService::new();

        let stats = service.aggregate(vec![Some(3.0), None, Some(f64::NAN)]);
        assert_eq!(stats.total_amount, 3.0);

        let stats = service.aggregate_amounts(&[f64::INFINITY, 1.0]);
        assert_eq!(stats.total_amount, 1.0);
        assert_eq!(stats.max_payment, 1.0);
    }

    #[test]
    fn test_share_guards_zero_total() {
        let service = ExpenseStatsService::new();
        let stats = service.aggregate_amounts(&[]);

        let share = service.share(&stats, "all");
        assert_eq!(share, 0.0);
        assert!(!share.is_nan());
        assert_eq!(service.share(&stats, "Food"), 0.0);

        let rows = service.breakdown(&stats);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].share, 0.0);
    }

    #[test]
    fn test_breakdown_sorted_by_amount() {
        let service = ExpenseStatsService::new();
        let events = vec![
            create_test_event("1", 20.0, ExpenseCategory::Food),
            create_test_event("2", 60.0, ExpenseCategory::Housing),
            create_test_event("3", 20.0, ExpenseCategory::Entertainment),
        ];

        let stats = service.aggregate_events(&events);
        let rows = service.breakdown(&stats);
        let categories: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["Housing", "Entertainment", "Food", "all"]);
        assert_close(rows[0].share, 0.6);
        assert_close(service.share(&stats, "Food"), 0.2);
        assert_eq!(service.format_share(rows[0].share), "60.00%");
    }

    #[test]
    fn test_running_total_and_formatting() {
        let service = ExpenseStatsService::with_currency_symbol("€");
        let events = vec![
            create_test_event("1", 12.5, ExpenseCategory::Food),
            create_test_event("2", 7.25, ExpenseCategory::Custom),
        ];

        assert_eq!(service.running_total(&events), "19.75");
        assert_eq!(service.running_total(&[]), "0.00");
        assert_eq!(service.format_amount(100.0), "€100.00");
        assert_eq!(ExpenseStatsService::new().format_amount(7.25), "$7.25");
    }
}
