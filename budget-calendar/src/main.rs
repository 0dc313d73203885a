use std::path::PathBuf;

use anyhow::Result;
use budget_calendar::{initialize_controller, AppConfig, AppController, EventForm, FormMode, MessageKind};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use shared::{parse_calendar_date, CalendarMonth};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Budget calendar: browse expenses by month and manage them on the event store
#[derive(Parser, Debug)]
#[command(name = "budget-calendar", version)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Event store URL, overrides the config file
    #[arg(long, global = true, env = "BUDGET_CALENDAR_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the month grid
    Month {
        /// Any day of the month to show (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Months to move from that date, e.g. -1 for the previous month
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// Show the total, the largest payment and the category breakdown
    Stats,
    /// Add an expense
    Add(ExpenseArgs),
    /// Change an existing expense; omitted fields keep their value
    Update {
        id: String,
        #[command(flatten)]
        fields: ExpenseArgs,
    },
    /// Delete an expense
    Delete { id: String },
}

#[derive(Args, Debug)]
struct ExpenseArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    cost: Option<String>,
    /// First day, YYYY-MM-DD
    #[arg(long)]
    start: Option<String>,
    /// Last day, YYYY-MM-DD (defaults to the first day when it would come earlier)
    #[arg(long)]
    end: Option<String>,
    /// Food, Housing, Personal Care, Groceries, Transportation, Entertainment or Custom
    #[arg(long)]
    category: Option<String>,
    /// Label for the Custom category
    #[arg(long)]
    reason: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

impl ExpenseArgs {
    /// Overwrite the form fields that were given on the command line.
    ///
    /// A new start without an end only moves the end when the current end
    /// would otherwise fall before it (or does not parse).
    fn apply_to(self, mut form: EventForm) -> EventForm {
        if let (Some(start), None) = (&self.start, &self.end) {
            let new_start = parse_calendar_date(start);
            let current_end = parse_calendar_date(&form.end_date);
            let end_too_early = match (new_start, current_end) {
                (Some(new_start), Some(current_end)) => current_end < new_start,
                _ => true,
            };
            if end_too_early {
                form.end_date = start.clone();
            }
        }
        let fields = [
            (self.name, &mut form.expense_name),
            (self.cost, &mut form.cost),
            (self.start, &mut form.start_date),
            (self.end, &mut form.end_date),
            (self.category, &mut form.category),
            (self.reason, &mut form.custom_reason),
            (self.description, &mut form.description),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        form
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    }
    .with_api_base_url_override(cli.api_url.clone());
    debug!("Configuration: {:?}", config);

    let today = Local::now().date_naive();
    let mut controller = initialize_controller(&config, today)?;

    let ok = match cli.command {
        Command::Month { date, offset } => {
            controller.set_focus_date(date.unwrap_or(today));
            controller.change_month(offset);
            let loaded = controller.refresh_events().await;
            print_month(&controller, &controller.calendar());
            loaded
        }
        Command::Stats => {
            let loaded = controller.refresh_events().await;
            print_stats(&controller);
            loaded
        }
        Command::Add(args) => {
            let start = args
                .start
                .as_deref()
                .and_then(|s| controller.calendar_service().parse_event_date(s))
                .unwrap_or(today);
            controller.open_add(start);
            let form = args.apply_to(EventForm::for_new(start));
            controller.submit(&FormMode::Add, &form).await
        }
        Command::Update { id, fields } => {
            if controller.refresh_events().await {
                let existing = controller.events().iter().find(|e| e.id == id).cloned();
                match existing {
                    Some(event) => {
                        controller.open_edit_event(event);
                        match controller.form_for_modal() {
                            Some((mode, form)) => controller.submit(&mode, &fields.apply_to(form)).await,
                            None => false,
                        }
                    }
                    None => {
                        error!("No expense with id {}", id);
                        false
                    }
                }
            } else {
                false
            }
        }
        Command::Delete { id } => {
            if controller.refresh_events().await {
                let existing = controller.events().iter().find(|e| e.id == id).cloned();
                match existing {
                    Some(event) => {
                        controller.open_edit_event(event);
                        controller.delete_selected().await
                    }
                    None => {
                        error!("No expense with id {}", id);
                        false
                    }
                }
            } else {
                false
            }
        }
    };

    if let Some(message) = controller.current_message() {
        match message.kind {
            MessageKind::Success => println!("{}", message.text),
            MessageKind::Error => eprintln!("{}", message.text),
        }
    }

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_month(controller: &AppController, calendar: &CalendarMonth) {
    let stats_service = controller.stats_service();
    println!("{} {}", calendar.month_name, calendar.year);
    println!(" Sun  Mon  Tue  Wed  Thu  Fri  Sat");

    for week in calendar.cells.chunks(7) {
        let row: Vec<String> = week
            .iter()
            .map(|cell| {
                if !cell.belongs_to_current_month {
                    format!("  {:>2} ", "·")
                } else {
                    let marker = if cell.events_on_this_date.is_empty() { ' ' } else { '*' };
                    if cell.is_today {
                        format!("[{:>2}]{}", cell.day_number, marker)
                    } else {
                        format!(" {:>2} {}", cell.day_number, marker)
                    }
                }
            })
            .collect();
        println!("{}", row.join(""));
    }

    println!();
    for cell in calendar.cells.iter().filter(|c| c.belongs_to_current_month) {
        for event in &cell.events_on_this_date {
            println!(
                "{}  #{} {} ({}) {}",
                cell.iso_date,
                event.id,
                event.expense_name,
                event.category,
                stats_service.format_amount(event.cost)
            );
        }
    }
}

fn print_stats(controller: &AppController) {
    let stats_service = controller.stats_service();
    let stats = controller.stats();

    println!("Total Spent:     {}", stats_service.format_amount(stats.total_amount));
    println!("Largest Payment: {}", stats_service.format_amount(stats.max_payment));
    println!();
    println!("Category Breakdown");
    if !stats_service.has_categories(&stats) {
        println!("  No expenses recorded for this view.");
        return;
    }
    for row in controller.breakdown() {
        println!(
            "  {:<16} {:>12} {:>8}",
            row.category,
            stats_service.format_amount(row.amount),
            stats_service.format_share(row.share)
        );
    }
}
