//! Display formatting for second counts

/// Format seconds as `HH:MM:SS` (hours are not capped at 99)
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Format seconds as `MM:SS`; minutes keep counting past 59
pub fn format_ms(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Parse `HH:MM:SS` or `MM:SS` back into seconds
pub fn parse_hms(s: &str) -> Option<u64> {
    let parts = s
        .trim()
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => Some(h * 3600 + m * 60 + s),
        [m, s] if *s < 60 => Some(m * 60 + s),
        _ => None,
    }
}

/// Seconds as fractional hours, the unit the history chart plots
pub fn hours(seconds: u64) -> f64 {
    seconds as f64 / 3600.0
}

/// Format seconds as `"2h 15m"`, or `"45m"` under an hour. Leftover seconds are dropped.
pub fn format_hours_short(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    if h > 0 {
        format!("{}h {}m", h, m)
    } else {
        format!("{}m", m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(360_000), "100:00:00");
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(1500), "25:00");
        assert_eq!(format_ms(59), "00:59");
        assert_eq!(format_ms(3725), "62:05");
    }

    #[test]
    fn test_parse_hms_inverts_format() {
        for t in [0, 1, 59, 60, 1499, 3600, 86_399, 86_400, 1_000_003] {
            assert_eq!(parse_hms(&format_hms(t)), Some(t));
            assert_eq!(parse_hms(&format_ms(t)), Some(t));
        }
    }

    #[test]
    fn test_parse_hms_rejects_garbage() {
        assert_eq!(parse_hms(""), None);
        assert_eq!(parse_hms("12"), None);
        assert_eq!(parse_hms("00:61:00"), None);
        assert_eq!(parse_hms("aa:bb"), None);
        assert_eq!(parse_hms("1:2:3:4"), None);
    }

    #[test]
    fn test_format_hours_short() {
        assert_eq!(format_hours_short(2 * 3600 + 15 * 60), "2h 15m");
        assert_eq!(format_hours_short(45 * 60), "45m");
        assert_eq!(format_hours_short(0), "0m");
        assert_eq!(format_hours_short(61 * 60 + 59), "1h 1m");
    }

    #[test]
    fn test_format_hours_short_every_whole_minute() {
        for minutes in 0..600u64 {
            let expected = if minutes >= 60 {
                format!("{}h {}m", minutes / 60, minutes % 60)
            } else {
                format!("{}m", minutes)
            };
            assert_eq!(format_hours_short(minutes * 60), expected, "{} minutes", minutes);
        }
    }
}
