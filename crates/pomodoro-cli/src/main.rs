//! Pomodoro CLI
//!
//! Command-line interface for viewing Pomodoro history and reports.

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pomodoro_core::{
    export::{ExportFormat, Exporter},
    format::{format_hms, format_hours_short, format_ms},
    recovery, report, DailyRecord, DailyTotals, DataPaths, Mode, RecoveryOutcome, TimerConfig,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

#[derive(Parser)]
#[command(name = "pomodoro")]
#[command(about = "Pomodoro history and reports")]
#[command(version)]
struct Cli {
    /// Directory holding the history and state files (defaults to the executable's directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's totals
    Today,

    /// Show yesterday's totals
    Yesterday,

    /// Show totals for the most recent recorded days
    History {
        /// Number of days to show (default 7)
        #[arg(short, long)]
        days: Option<usize>,
    },

    /// Compare today's work with yesterday's
    Report,

    /// Show the saved timer state as it would resume now
    Status,

    /// Export daily totals to CSV or JSON
    Export {
        /// Output format (csv or json)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only the most recent N recorded days
        #[arg(short, long)]
        days: Option<usize>,
    },
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Time")]
    time: String,
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Work")]
    work: String,
    #[tabled(rename = "Break")]
    brk: String,
    #[tabled(rename = "Idle")]
    idle: String,
    #[tabled(rename = "Total")]
    total: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pomodoro=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let paths = cli
        .data_dir
        .map(DataPaths::in_dir)
        .unwrap_or_else(DataPaths::resolve);
    let totals = DailyTotals::load(&paths.history_file);
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Today => show_day(&totals, today, "Today"),
        Commands::Yesterday => show_day(&totals, today - Duration::days(1), "Yesterday"),
        Commands::History { days } => {
            show_history(&totals, days.unwrap_or(TimerConfig::default().recent_days))
        }
        Commands::Report => {
            let comparison = report::compare_days(&totals, today);
            println!("\n{}", report::render_report(&comparison, today));
            Ok(())
        }
        Commands::Status => show_status(&paths),
        Commands::Export {
            format,
            output,
            days,
        } => {
            let export_format = ExportFormat::parse(&format).unwrap_or(ExportFormat::Json);
            let writer: Box<dyn Write> = match output {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(io::stdout()),
            };
            Exporter::new(&totals).export(writer, days, export_format)?;
            Ok(())
        }
    }
}

fn show_day(totals: &DailyTotals, date: NaiveDate, label: &str) -> Result<()> {
    if !totals.contains(date) {
        println!("\n{}", format!("Nothing recorded for {}.", date).yellow());
        return Ok(());
    }
    let record = totals.get(date);

    println!("\n{}", format!("{} ({})", label, date).bold().cyan());
    println!("{}", "-".repeat(32));

    let rows = vec![
        StatRow {
            category: "Work".to_string(),
            time: format_hms(record.work_seconds),
        },
        StatRow {
            category: "Break".to_string(),
            time: format_hms(record.break_seconds),
        },
        StatRow {
            category: "Idle break".to_string(),
            time: format_hms(record.idle_seconds),
        },
        StatRow {
            category: "Total".to_string(),
            time: format_hms(record.total_seconds()),
        },
    ];

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    Ok(())
}

fn day_row(date: NaiveDate, record: DailyRecord) -> DayRow {
    DayRow {
        date: date.format("%Y-%m-%d").to_string(),
        work: format_hours_short(record.work_seconds),
        brk: format_hours_short(record.break_seconds),
        idle: format_hours_short(record.idle_seconds),
        total: format_hours_short(record.total_seconds()),
    }
}

fn show_history(totals: &DailyTotals, days: usize) -> Result<()> {
    let recent = totals.recent_days(days);

    if recent.is_empty() {
        println!("\n{}", "No history recorded yet.".yellow());
        return Ok(());
    }

    println!("\n{}", "Recent Days".bold().cyan());
    println!("{}", "-".repeat(60));

    let rows: Vec<DayRow> = recent
        .into_iter()
        .map(|(date, record)| day_row(date, record))
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    Ok(())
}

fn show_status(paths: &DataPaths) -> Result<()> {
    let config = TimerConfig::default();
    let saved = recovery::read_snapshot(&paths.state_file, &config)?;
    if saved.is_none() {
        println!("{}", "No saved timer state.".yellow());
        return Ok(());
    }

    // Replay against a scratch store so nothing on disk changes
    let mut scratch = DailyTotals::new_in_memory();
    let now = Local::now();
    let (state, outcome) = recovery::reconcile(saved, config, &mut scratch, now);

    let clock = if state.mode() == Mode::IdleBreak {
        format_ms(state.idle_elapsed(now))
    } else {
        format_ms(u64::from(state.time_left()))
    };
    let running = if state.is_running() {
        "running".green()
    } else {
        "stopped".red()
    };
    println!("{} {} ({})", state.mode().to_string().bold(), clock, running);

    if let RecoveryOutcome::IdleExpired {
        committed_seconds, ..
    } = outcome
    {
        println!(
            "Pending idle time on next start: {}",
            format_hms(committed_seconds)
        );
    }
    if let Some(message) = outcome.describe() {
        println!("{}", message.dimmed());
    }

    Ok(())
}
