//! Today-versus-yesterday work comparison

use crate::format::{format_hms, hours};
use crate::history::DailyTotals;
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DailyComparison {
    /// Both days recorded and yesterday had some work
    Compared {
        today: u64,
        yesterday: u64,
        diff_seconds: i64,
        diff_percent: f64,
    },
    /// Work seconds for whichever days exist. `yesterday == Some(0)` means
    /// the day was recorded but no work was done.
    InsufficientData {
        today: Option<u64>,
        yesterday: Option<u64>,
    },
}

/// How much work today amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effort {
    Full,
    Steady,
    Light,
}

impl Effort {
    pub fn for_work_seconds(seconds: u64) -> Self {
        let h = hours(seconds);
        if h > 6.0 {
            Effort::Full
        } else if h > 3.0 {
            Effort::Steady
        } else {
            Effort::Light
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Effort::Full => "A very full day. Keep that energy going!",
            Effort::Steady => "Solid focus today. Consistency wins.",
            Effort::Light => "Not much time, but every minute counts. Build on it tomorrow.",
        }
    }
}

pub fn compare_days(totals: &DailyTotals, today: NaiveDate) -> DailyComparison {
    let yesterday = today - Duration::days(1);
    let today_work = totals.contains(today).then(|| totals.get(today).work_seconds);
    let yesterday_work = totals
        .contains(yesterday)
        .then(|| totals.get(yesterday).work_seconds);

    match (today_work, yesterday_work) {
        (Some(t), Some(y)) if y > 0 => {
            let diff_seconds = t as i64 - y as i64;
            DailyComparison::Compared {
                today: t,
                yesterday: y,
                diff_seconds,
                diff_percent: diff_seconds as f64 / y as f64 * 100.0,
            }
        }
        (today, yesterday) => DailyComparison::InsufficientData { today, yesterday },
    }
}

/// Plain-text daily report
pub fn render_report(comparison: &DailyComparison, today: NaiveDate) -> String {
    let mut lines = vec![format!("Report for {}", today.format("%Y-%m-%d"))];

    match *comparison {
        DailyComparison::Compared {
            today,
            yesterday,
            diff_seconds,
            diff_percent,
        } => {
            lines.push(format!("Work today:     {}", format_hms(today)));
            lines.push(format!("Work yesterday: {}", format_hms(yesterday)));
            if diff_seconds >= 0 {
                lines.push(format!(
                    "Well done! {} more than yesterday ({:.1}%).",
                    format_hms(diff_seconds.unsigned_abs()),
                    diff_percent
                ));
                lines.push(Effort::for_work_seconds(today).message().to_string());
            } else {
                lines.push(format!(
                    "Heads up: {} less than yesterday ({:.1}%).",
                    format_hms(diff_seconds.unsigned_abs()),
                    diff_percent.abs()
                ));
                lines.push("Tomorrow, try to:".to_string());
                lines.push("  - set one clear goal".to_string());
                lines.push("  - shut out distractions".to_string());
                lines.push("  - take real breaks".to_string());
            }
        }
        DailyComparison::InsufficientData { today, yesterday } => {
            match today {
                Some(t) => lines.push(format!("Worked {} today. Keep it up!", format_hms(t))),
                None => lines.push("Nothing recorded today yet. Start a focus session!".to_string()),
            }
            match yesterday {
                None => lines.push("No record for yesterday, nothing to compare.".to_string()),
                Some(0) => lines.push("No work recorded yesterday, nothing to compare.".to_string()),
                Some(_) => {}
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_compare_improvement() {
        let mut totals = DailyTotals::new_in_memory();
        totals.increment(day(11), Category::Work, 3600);
        totals.increment(day(12), Category::Work, 5400);

        let cmp = compare_days(&totals, day(12));
        assert_eq!(
            cmp,
            DailyComparison::Compared {
                today: 5400,
                yesterday: 3600,
                diff_seconds: 1800,
                diff_percent: 50.0
            }
        );
        let text = render_report(&cmp, day(12));
        assert!(text.contains("00:30:00 more than yesterday (50.0%)"));
    }

    #[test]
    fn test_compare_decline() {
        let mut totals = DailyTotals::new_in_memory();
        totals.increment(day(11), Category::Work, 7200);
        totals.increment(day(12), Category::Work, 1800);

        let cmp = compare_days(&totals, day(12));
        let DailyComparison::Compared { diff_seconds, .. } = cmp else {
            panic!("expected comparison, got {:?}", cmp);
        };
        assert_eq!(diff_seconds, -5400);
        assert!(render_report(&cmp, day(12)).contains("01:30:00 less than yesterday (75.0%)"));
    }

    #[test]
    fn test_yesterday_without_work_is_insufficient() {
        let mut totals = DailyTotals::new_in_memory();
        totals.increment(day(11), Category::Break, 600);
        totals.increment(day(12), Category::Work, 1500);

        let cmp = compare_days(&totals, day(12));
        assert_eq!(
            cmp,
            DailyComparison::InsufficientData {
                today: Some(1500),
                yesterday: Some(0)
            }
        );
        assert!(render_report(&cmp, day(12)).contains("No work recorded yesterday"));
    }

    #[test]
    fn test_empty_history() {
        let totals = DailyTotals::new_in_memory();
        let cmp = compare_days(&totals, day(12));
        assert_eq!(
            cmp,
            DailyComparison::InsufficientData {
                today: None,
                yesterday: None
            }
        );
        let text = render_report(&cmp, day(12));
        assert!(text.contains("Nothing recorded today"));
        assert!(text.contains("No record for yesterday"));
    }

    #[test]
    fn test_effort_tiers() {
        assert_eq!(Effort::for_work_seconds(7 * 3600), Effort::Full);
        assert_eq!(Effort::for_work_seconds(6 * 3600), Effort::Steady);
        assert_eq!(Effort::for_work_seconds(3 * 3600), Effort::Light);
    }
}
