//! Pomodoro Timer
//!
//! Foreground process that owns the session. Reads one-word commands from
//! stdin and drives the countdown, idle display and autosave sources, all on
//! a single thread.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use pomodoro_core::{
    format::{format_hms, format_ms},
    report, Controller, DataPaths, Mode, Notice, SessionEvent, TimerConfig,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};
use tracing::info;

#[derive(Parser)]
#[command(name = "pomodoro-timer")]
#[command(about = "Pomodoro timer with work, break and idle break tracking")]
#[command(version)]
struct Cli {
    /// Directory for the history and state files (defaults to the executable's directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Pause,
    Toggle,
    Idle,
    Back,
    Reset,
    Status,
    Report,
    Help,
    Quit,
}

impl Command {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" | "s" => Some(Command::Start),
            "pause" | "p" => Some(Command::Pause),
            "toggle" | "t" => Some(Command::Toggle),
            "idle" | "i" => Some(Command::Idle),
            "back" | "b" => Some(Command::Back),
            "reset" | "r" => Some(Command::Reset),
            "status" | "" => Some(Command::Status),
            "report" => Some(Command::Report),
            "help" | "h" | "?" => Some(Command::Help),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

fn every_second() -> Interval {
    let period = Duration::from_secs(1);
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pomodoro=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let paths = cli
        .data_dir
        .map(DataPaths::in_dir)
        .unwrap_or_else(DataPaths::resolve);
    info!("Using data files {:?} and {:?}", paths.history_file, paths.state_file);

    let config = TimerConfig::default();
    let (mut controller, outcome, notices) = Controller::open(paths, config, Local::now());
    if let Some(message) = outcome.describe() {
        println!("{}", message.cyan());
    }
    show(&notices);
    print_status(&controller);
    print_help();

    let mut ticker = every_second();
    let mut idle_refresh = every_second();
    let autosave_period = Duration::from_secs(u64::from(config.autosave_every_ticks));
    let mut autosave = time::interval_at(Instant::now() + autosave_period, autosave_period);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick(), if controller.session().is_running() => {
                let notices = controller.tick(Local::now());
                show(&notices);
            }
            _ = idle_refresh.tick(), if controller.session().is_idle() => {
                print_idle_line(&controller);
            }
            _ = autosave.tick() => {
                show(&controller.autosave(Local::now()));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let Some(command) = Command::parse(&line) else {
                    println!("{} {:?} (type 'help')", "Unknown command".yellow(), line.trim());
                    continue;
                };
                if command == Command::Quit {
                    break;
                }
                let was_running = controller.session().is_running();
                let was_idle = controller.session().is_idle();
                run_command(&mut controller, command);
                if !was_running && controller.session().is_running() {
                    ticker.reset();
                }
                if !was_idle && controller.session().is_idle() {
                    idle_refresh.reset();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    show(&controller.shutdown(Local::now()));
    println!("{}", "Session saved. Bye!".dimmed());
    Ok(())
}

fn run_command(controller: &mut Controller, command: Command) {
    let now = Local::now();
    let result = match command {
        Command::Start => controller.start(now),
        Command::Pause => controller.pause(now),
        Command::Toggle => controller.toggle_running(now),
        Command::Idle => controller.enter_idle(now),
        Command::Back => controller.exit_idle(now),
        Command::Reset => Ok(controller.reset(now)),
        Command::Status => {
            print_status(controller);
            return;
        }
        Command::Report => {
            println!("{}", report::render_report(&controller.compare_days(now), now.date_naive()));
            return;
        }
        Command::Help => {
            print_help();
            return;
        }
        Command::Quit => return,
    };

    match result {
        Ok(notices) => show(&notices),
        Err(e) => println!("{} {}", "Cannot do that:".yellow(), e),
    }
}

fn mode_colored(mode: Mode) -> colored::ColoredString {
    match mode {
        Mode::Working => mode.label().red().bold(),
        Mode::OnBreak => mode.label().green().bold(),
        Mode::IdleBreak => mode.label().yellow().bold(),
    }
}

fn show(notices: &[Notice]) {
    for notice in notices {
        match notice {
            Notice::Session(SessionEvent::Ticked { mode, time_left }) => {
                print!("\r{} {}   ", mode_colored(*mode), format_ms(u64::from(*time_left)));
                let _ = std::io::stdout().flush();
            }
            Notice::Session(SessionEvent::IntervalCompleted { ended, .. }) => {
                println!();
                let message = match ended {
                    Mode::Working => "Work interval finished, take a break!",
                    _ => "Break finished, back to work!",
                };
                println!("{}", message.bold().cyan());
            }
            Notice::Session(SessionEvent::Started { mode }) => {
                println!("{} started", mode_colored(*mode));
            }
            Notice::Session(SessionEvent::Paused { mode }) => {
                println!();
                println!("{} paused", mode_colored(*mode));
            }
            Notice::Session(SessionEvent::IdleStarted { .. }) => {
                println!();
                println!("{} (type 'back' to end it)", mode_colored(Mode::IdleBreak));
            }
            Notice::Session(SessionEvent::IdleEnded { idle_seconds }) => {
                println!();
                println!("Idle break over after {}. Ready to work.", format_hms(*idle_seconds));
            }
            Notice::Session(SessionEvent::Reset) => {
                println!();
                println!("Timer reset. Ready to work.");
            }
            Notice::SaveFailed { file, reason } => {
                println!();
                println!("{} {:?}: {}", "Could not save".yellow().bold(), file, reason);
            }
        }
    }
}

fn print_idle_line(controller: &Controller) {
    let now = Local::now();
    print!(
        "\r{} {}  (idle today {})   ",
        mode_colored(Mode::IdleBreak),
        format_ms(controller.session().idle_elapsed(now)),
        format_hms(controller.idle_preview(now))
    );
    let _ = std::io::stdout().flush();
}

fn print_status(controller: &Controller) {
    let now = Local::now();
    let session = controller.session();
    let clock = if session.is_idle() {
        format_ms(session.idle_elapsed(now))
    } else {
        format_ms(u64::from(session.time_left()))
    };
    let state = if session.is_idle() || session.is_running() {
        "running"
    } else {
        "stopped"
    };
    let today = controller.today(now);

    println!("{} {} ({})", mode_colored(session.mode()), clock.bold(), state);
    println!(
        "Today  work {}  break {}  idle {}",
        format_hms(today.work_seconds),
        format_hms(today.break_seconds),
        format_hms(controller.idle_preview(now))
    );
}

fn print_help() {
    println!(
        "{}",
        "Commands: start, pause, toggle, idle, back, reset, status, report, help, quit".dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("start"), Some(Command::Start));
        assert_eq!(Command::parse("  P \n"), Some(Command::Pause));
        assert_eq!(Command::parse(""), Some(Command::Status));
        assert_eq!(Command::parse("back"), Some(Command::Back));
        assert_eq!(Command::parse("launch"), None);
    }
}
