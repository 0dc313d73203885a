//! Application controller.
//!
//! `AppController` owns all state a calendar front end needs: the month in
//! focus, the current snapshot of events, which modal is open, and the
//! transient status message. Views read from it and forward user actions to
//! it; they hold no state of their own.

use chrono::NaiveDate;
use shared::{AggregateStats, CalendarMonth, CategoryShare, Event, SpendResponse};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::domain::calendar::CalendarService;
use crate::domain::event_form::{first_error_message, EventForm, FormMode};
use crate::domain::expense_stats::ExpenseStatsService;
use crate::io::event_store::{EventStore, StoreError};

/// Which modal, if any, is open
#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    /// Adding an expense from a day cell
    Add { date: NaiveDate },
    /// Editing a single expense
    EditEvent(Event),
    /// Listing every expense of one day
    EditDay { date: NaiveDate, events: Vec<Event> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

/// A user-facing status line that disappears after a timeout
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
    shown_at: Instant,
}

impl StatusMessage {
    fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            shown_at: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.shown_at) >= timeout
    }
}

pub struct AppController {
    store: Arc<dyn EventStore>,
    calendar_service: CalendarService,
    stats_service: ExpenseStatsService,
    focus_date: NaiveDate,
    today: NaiveDate,
    events: Vec<Event>,
    modal: ModalState,
    message: Option<StatusMessage>,
    message_timeout: Duration,
}

impl AppController {
    pub fn new(store: Arc<dyn EventStore>, config: &AppConfig, today: NaiveDate) -> Self {
        Self {
            store,
            calendar_service: CalendarService::new(),
            stats_service: ExpenseStatsService::with_currency_symbol(config.currency_symbol.clone()),
            focus_date: today,
            today,
            events: Vec::new(),
            modal: ModalState::Closed,
            message: None,
            message_timeout: config.message_timeout(),
        }
    }

    pub fn focus_date(&self) -> NaiveDate {
        self.focus_date
    }

    pub fn set_focus_date(&mut self, date: NaiveDate) {
        self.focus_date = date;
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn calendar_service(&self) -> &CalendarService {
        &self.calendar_service
    }

    pub fn stats_service(&self) -> &ExpenseStatsService {
        &self.stats_service
    }

    /// Reload the event snapshot from the store.
    ///
    /// On failure the previous snapshot is kept and an error message is shown.
    pub async fn refresh_events(&mut self) -> bool {
        match self.store.list().await {
            Ok(events) => {
                debug!("Loaded {} events", events.len());
                self.events = events;
                true
            }
            Err(e) => {
                warn!("Failed to refresh events: {:?}", e);
                self.show_message(MessageKind::Error, e.to_string());
                false
            }
        }
    }

    /// Move the focus by `delta` months
    pub fn change_month(&mut self, delta: i32) -> NaiveDate {
        self.focus_date = self.calendar_service.shift_month(self.focus_date, delta);
        info!(
            "Calendar moved to {}",
            self.calendar_service.format_month_header(self.focus_date)
        );
        self.focus_date
    }

    /// Grid for the month in focus
    pub fn calendar(&self) -> CalendarMonth {
        self.calendar_service
            .build_month_grid(self.focus_date, self.today, &self.events)
    }

    /// Category breakdown over the current snapshot
    pub fn stats(&self) -> AggregateStats {
        self.stats_service.aggregate_events(&self.events)
    }

    pub fn breakdown(&self) -> Vec<CategoryShare> {
        self.stats_service.breakdown(&self.stats())
    }

    /// Sum of every event cost, two decimals
    pub fn running_total(&self) -> String {
        self.stats_service.running_total(&self.events)
    }

    pub fn open_add(&mut self, date: NaiveDate) {
        self.modal = ModalState::Add { date };
    }

    pub fn open_edit_event(&mut self, event: Event) {
        self.modal = ModalState::EditEvent(event);
    }

    /// Open the day view; does nothing on a day without events
    pub fn open_edit_day(&mut self, date: NaiveDate) -> bool {
        let events = self.calendar_service.events_on_date(&self.events, date);
        if events.is_empty() {
            return false;
        }
        self.modal = ModalState::EditDay { date, events };
        true
    }

    /// Close the modal and clear any status message
    pub fn close_modal(&mut self) {
        self.modal = ModalState::Closed;
        self.message = None;
    }

    /// Form to show for the open modal, with the mode it submits in
    pub fn form_for_modal(&self) -> Option<(FormMode, EventForm)> {
        match &self.modal {
            ModalState::Add { date } => Some((FormMode::Add, EventForm::for_new(*date))),
            ModalState::EditEvent(event) => Some((
                FormMode::Edit {
                    event_id: event.id.clone(),
                },
                EventForm::for_event(event),
            )),
            ModalState::Closed | ModalState::EditDay { .. } => None,
        }
    }

    /// Validate and send an add/update.
    ///
    /// Validation failures are reported without contacting the store. On
    /// success the snapshot is reloaded and the modal closed; on failure the
    /// modal stays open so the user can retry.
    pub async fn submit(&mut self, mode: &FormMode, form: &EventForm) -> bool {
        let request = match form.to_request(mode) {
            Ok(request) => request,
            Err(errors) => {
                let text = first_error_message(&errors)
                    .unwrap_or_else(|| "Please fill in all required fields.".to_string());
                debug!("Form rejected: {:?}", errors);
                self.show_message(MessageKind::Error, text);
                return false;
            }
        };

        info!("Submitting {:?} request", request.action);
        let result = self.store.submit(request).await;
        self.finish_request(result).await
    }

    /// Delete the expense whose edit modal is open
    pub async fn delete_selected(&mut self) -> bool {
        let event_id = match &self.modal {
            ModalState::EditEvent(event) => event.id.clone(),
            _ => {
                self.show_message(MessageKind::Error, "Select an expense to delete.");
                return false;
            }
        };

        info!("Deleting event {}", event_id);
        let result = self.store.delete(&event_id).await;
        self.finish_request(result).await
    }

    /// The status message, if it has not yet expired at `now`
    pub fn message(&mut self, now: Instant) -> Option<&StatusMessage> {
        let timeout = self.message_timeout;
        if self
            .message
            .as_ref()
            .is_some_and(|m| m.is_expired(now, timeout))
        {
            self.message = None;
        }
        self.message.as_ref()
    }

    pub fn current_message(&mut self) -> Option<&StatusMessage> {
        self.message(Instant::now())
    }

    async fn finish_request(&mut self, result: Result<SpendResponse, StoreError>) -> bool {
        match result {
            Ok(response) => {
                self.show_message(MessageKind::Success, response.message);
                self.refresh_events().await;
                self.modal = ModalState::Closed;
                true
            }
            Err(e) => {
                warn!("Event store request failed: {:?}", e);
                self.show_message(MessageKind::Error, e.to_string());
                false
            }
        }
    }

    fn show_message(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.message = Some(StatusMessage::new(kind, text));
    }
}
