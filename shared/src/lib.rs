use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Key that is always present in `AggregateStats::category_totals`
pub const ALL_CATEGORIES_KEY: &str = "all";

/// An expense record as stored by the event store.
///
/// Records are read-only snapshots: the store owns them and every change goes
/// through a `SpendRequest`. Records that only carry the single-day `date`
/// tag get that day as their range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredEvent")]
pub struct Event {
    /// Opaque identifier; numeric ids from the store are kept as strings
    pub id: String,
    pub expense_name: String,
    /// First day of the expense (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the expense (inclusive)
    pub end_date: NaiveDate,
    /// Optional single-day tag, matched in addition to the date range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Amount spent; anything that is not a number is read as 0
    pub cost: f64,
    pub category: ExpenseCategory,
    /// Free-text label, only meaningful when `category` is `Custom`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_reason: Option<String>,
    pub description: String,
}

/// An event as it arrives from the store, before its dates are settled
#[derive(Debug, Deserialize)]
struct StoredEvent {
    #[serde(deserialize_with = "lenient::id")]
    id: String,
    #[serde(default)]
    expense_name: String,
    #[serde(default, deserialize_with = "lenient::present_date")]
    start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::present_date")]
    end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::cost")]
    cost: f64,
    #[serde(default = "ExpenseCategory::unspecified")]
    category: ExpenseCategory,
    #[serde(default)]
    custom_reason: Option<String>,
    #[serde(default)]
    description: String,
}

impl TryFrom<StoredEvent> for Event {
    type Error = String;

    fn try_from(raw: StoredEvent) -> Result<Self, Self::Error> {
        let start_date = raw.start_date.or(raw.date).or(raw.end_date);
        let end_date = raw.end_date.or(raw.date).or(raw.start_date);
        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) => Ok(Event {
                id: raw.id,
                expense_name: raw.expense_name,
                start_date,
                end_date,
                date: raw.date,
                cost: raw.cost,
                category: raw.category,
                custom_reason: raw.custom_reason,
                description: raw.description,
            }),
            _ => Err(format!("event {} has no start_date, end_date or date", raw.id)),
        }
    }
}

impl Event {
    /// Whether this event is shown on the given calendar day.
    ///
    /// Matches either the single-day tag or the inclusive date range.
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        self.date == Some(day) || (self.start_date <= day && self.end_date >= day)
    }

    /// Label used when grouping this event in a category breakdown
    pub fn category_label(&self) -> &'static str {
        self.category.label()
    }
}

/// Fixed set of expense categories offered by the expense form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ExpenseCategory {
    #[default]
    Food,
    Housing,
    PersonalCare,
    Groceries,
    Transportation,
    Entertainment,
    Custom,
}

impl ExpenseCategory {
    /// All categories in the order the form lists them
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::Food,
        ExpenseCategory::Housing,
        ExpenseCategory::PersonalCare,
        ExpenseCategory::Groceries,
        ExpenseCategory::Transportation,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Housing => "Housing",
            ExpenseCategory::PersonalCare => "Personal Care",
            ExpenseCategory::Groceries => "Groceries",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Custom => "Custom",
        }
    }

    /// Parse a category label; labels outside the fixed set are `Custom`
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(trimmed))
            .unwrap_or(ExpenseCategory::Custom)
    }

    /// Category assigned to records that arrive without one
    pub fn unspecified() -> Self {
        ExpenseCategory::Custom
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ExpenseCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ExpenseCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(ExpenseCategory::from_label)
            .unwrap_or_else(ExpenseCategory::unspecified))
    }
}

/// One day in the 42-cell month grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub day_number: u32,
    pub belongs_to_current_month: bool,
    pub iso_date: NaiveDate,
    pub is_today: bool,
    /// Always empty for days of the adjacent months
    pub events_on_this_date: Vec<Event>,
}

/// A month laid out as six Sunday-first weeks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub first_day_of_week: u32, // 0 = Sunday, 1 = Monday, etc.
    pub cells: Vec<GridCell>,
}

/// Totals shown in the expense panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_amount: f64,
    pub max_payment: f64,
    /// Per-category sums; always contains the `"all"` key
    pub category_totals: BTreeMap<String, f64>,
}

impl Default for AggregateStats {
    fn default() -> Self {
        let mut category_totals = BTreeMap::new();
        category_totals.insert(ALL_CATEGORIES_KEY.to_string(), 0.0);
        Self {
            total_amount: 0.0,
            max_payment: 0.0,
            category_totals,
        }
    }
}

/// One row of the category breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    /// Fraction of the total in `0.0..=1.0`; 0 when the total is 0
    pub share: f64,
}

/// Action carried by a `POST /spend` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendAction {
    Add,
    Update,
    Delete,
}

/// Editable fields of an event, as sent to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub expense_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_reason: Option<String>,
}

/// Body of `POST /spend`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRequest {
    pub action: SpendAction,
    #[serde(flatten)]
    pub fields: Option<EventFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl SpendRequest {
    pub fn add(fields: EventFields) -> Self {
        Self {
            action: SpendAction::Add,
            fields: Some(fields),
            event_id: None,
        }
    }

    pub fn update(event_id: impl Into<String>, fields: EventFields) -> Self {
        Self {
            action: SpendAction::Update,
            fields: Some(fields),
            event_id: Some(event_id.into()),
        }
    }

    pub fn delete(event_id: impl Into<String>) -> Self {
        Self {
            action: SpendAction::Delete,
            fields: None,
            event_id: Some(event_id.into()),
        }
    }
}

/// Reply to `POST /spend`, on success and on failure alike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendResponse {
    #[serde(default)]
    pub message: String,
    /// Present when the store echoes the stored record back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

/// Today's date, pre-formatted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentDateResponse {
    pub month: u32,
    pub year: i32,
    pub day: u32,
    pub formatted_date: String,
    pub iso_date: String,
}

/// Read a cost-like JSON value as a number.
///
/// Numbers and numeric strings are taken as-is; anything else, including
/// non-finite values, counts as 0.
pub fn coerce_amount(value: &Value) -> f64 {
    let amount = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_leading_number(s),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    if amount.is_finite() {
        amount
    } else {
        0.0
    }
}

/// Parse a date string, ignoring any time component after the date
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let date_part = input.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

// Takes the longest numeric prefix, so "12.50 USD" reads as 12.5
fn parse_leading_number(input: &str) -> f64 {
    let trimmed = input.trim();
    let mut end = 0;
    for (idx, ch) in trimmed.char_indices() {
        let candidate = &trimmed[..idx + ch.len_utf8()];
        if candidate == "-" || candidate == "+" || candidate == "." || candidate.parse::<f64>().is_ok() {
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

mod lenient {
    use super::{coerce_amount, parse_calendar_date};
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!("invalid event id: {}", other))),
        }
    }

    pub fn cost<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(coerce_amount).unwrap_or(0.0))
    }

    /// Missing or null is `None`; a value that is there must parse
    pub fn present_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_calendar_date(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {}", raw))),
            None => Ok(None),
        }
    }

    pub fn optional_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_calendar_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_event_from_store_json() {
        let event: Event = serde_json::from_value(json!({
            "id": 7,
            "expense_name": "Lunch",
            "start_date": "2024-06-05",
            "end_date": "2024-06-05T00:00:00",
            "cost": "12.50",
            "category": "Personal Care",
            "description": "sandwich"
        }))
        .unwrap();

        assert_eq!(event.id, "7");
        assert_eq!(event.start_date, ymd(2024, 6, 5));
        assert_eq!(event.end_date, ymd(2024, 6, 5));
        assert_eq!(event.cost, 12.5);
        assert_eq!(event.category, ExpenseCategory::PersonalCare);
        assert_eq!(event.date, None);
    }

    #[test]
    fn test_event_cost_coercion() {
        let event: Event = serde_json::from_value(json!({
            "id": "a",
            "start_date": "2024-06-05",
            "end_date": "2024-06-05",
            "cost": "not a number",
        }))
        .unwrap();
        assert_eq!(event.cost, 0.0);
        assert_eq!(event.category, ExpenseCategory::Custom);

        let event: Event = serde_json::from_value(json!({
            "id": "b",
            "start_date": "2024-06-05",
            "end_date": "2024-06-05",
            "cost": null,
        }))
        .unwrap();
        assert_eq!(event.cost, 0.0);
    }

    #[test]
    fn test_event_rejects_bad_dates() {
        let result: Result<Event, _> = serde_json::from_value(json!({
            "id": "a",
            "start_date": "June 5th",
            "end_date": "2024-06-05",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_with_only_a_date_tag() {
        let event: Event = serde_json::from_value(json!({
            "id": 1,
            "expense_name": "Coffee",
            "date": "2024-06-05",
            "cost": 4,
            "category": "Food",
        }))
        .unwrap();

        assert_eq!(event.start_date, ymd(2024, 6, 5));
        assert_eq!(event.end_date, ymd(2024, 6, 5));
        assert_eq!(event.date, Some(ymd(2024, 6, 5)));
        assert!(event.occurs_on(ymd(2024, 6, 5)));
        assert!(!event.occurs_on(ymd(2024, 6, 6)));

        // One end of the range is enough
        let event: Event = serde_json::from_value(json!({
            "id": 2,
            "start_date": "2024-06-07",
        }))
        .unwrap();
        assert_eq!(event.end_date, ymd(2024, 6, 7));
    }

    #[test]
    fn test_event_without_any_date_is_rejected() {
        let result: Result<Event, _> = serde_json::from_value(json!({
            "id": "a",
            "expense_name": "Mystery",
            "cost": 3,
        }));
        assert!(result.is_err());

        let events: Vec<Result<Event, _>> = [
            json!({"id": 1, "date": "2024-06-05"}),
            json!({"id": 2, "date": null}),
        ]
        .into_iter()
        .map(serde_json::from_value::<Event>)
        .collect();
        assert!(events[0].is_ok());
        assert!(events[1].is_err());
    }

    #[test]
    fn test_event_serializes_back_to_store_shape() {
        let event: Event = serde_json::from_value(json!({
            "id": 9,
            "start_date": "2024-06-05",
            "end_date": "2024-06-06",
            "cost": 5,
        }))
        .unwrap();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["start_date"], json!("2024-06-05"));
        assert_eq!(value["category"], json!("Custom"));
        assert!(value.get("date").is_none());

        let again: Event = serde_json::from_value(value).unwrap();
        assert_eq!(again, event);
    }

    #[test]
    fn test_occurs_on() {
        let event: Event = serde_json::from_value(json!({
            "id": "trip",
            "start_date": "2024-06-28",
            "end_date": "2024-07-02",
            "date": "2024-06-01",
        }))
        .unwrap();

        assert!(event.occurs_on(ymd(2024, 6, 1)));
        assert!(event.occurs_on(ymd(2024, 6, 28)));
        assert!(event.occurs_on(ymd(2024, 7, 2)));
        assert!(!event.occurs_on(ymd(2024, 6, 27)));
        assert!(!event.occurs_on(ymd(2024, 7, 3)));
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(ExpenseCategory::from_label("Personal Care"), ExpenseCategory::PersonalCare);
        assert_eq!(ExpenseCategory::from_label("groceries"), ExpenseCategory::Groceries);
        assert_eq!(ExpenseCategory::from_label("Pets"), ExpenseCategory::Custom);
        assert_eq!(
            serde_json::to_value(ExpenseCategory::PersonalCare).unwrap(),
            json!("Personal Care")
        );
    }

    #[test]
    fn test_spend_request_wire_format() {
        let fields = EventFields {
            expense_name: "Rent".to_string(),
            start_date: ymd(2024, 6, 1),
            end_date: ymd(2024, 6, 1),
            description: "June rent".to_string(),
            category: ExpenseCategory::Housing,
            cost: 900.0,
            custom_reason: None,
        };

        let body = serde_json::to_value(SpendRequest::update("42", fields)).unwrap();
        assert_eq!(body["action"], json!("update"));
        assert_eq!(body["event_id"], json!("42"));
        assert_eq!(body["start_date"], json!("2024-06-01"));
        assert_eq!(body["category"], json!("Housing"));
        assert_eq!(body["cost"], json!(900.0));

        let body = serde_json::to_value(SpendRequest::delete("42")).unwrap();
        assert_eq!(body, json!({"action": "delete", "event_id": "42"}));
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(&json!(10)), 10.0);
        assert_eq!(coerce_amount(&json!("7.25")), 7.25);
        assert_eq!(coerce_amount(&json!("12.50 USD")), 12.5);
        assert_eq!(coerce_amount(&json!("abc")), 0.0);
        assert_eq!(coerce_amount(&json!(null)), 0.0);
        assert_eq!(coerce_amount(&json!({"cost": 3})), 0.0);
    }

    #[test]
    fn test_default_stats_have_all_key() {
        let stats = AggregateStats::default();
        assert_eq!(stats.category_totals.get(ALL_CATEGORIES_KEY), Some(&0.0));
        assert_eq!(stats.category_totals.len(), 1);
    }
}
