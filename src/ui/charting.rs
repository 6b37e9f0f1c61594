use crate::stats::SessionRecord;

/// WPM of the recorded sessions as `(session number, wpm)`, oldest first.
pub fn wpm_points(history: &[SessionRecord]) -> Vec<(f64, f64)> {
    history
        .iter()
        .rev()
        .enumerate()
        .map(|(i, record)| ((i + 1) as f64, f64::from(record.wpm)))
        .collect()
}

/// Compute X (session) and Y (WPM) bounds for the history chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);

    let mut sessions = points.last().map_or(1.0, |p| p.0);
    if sessions < 2.0 {
        sessions = 2.0;
    }

    (sessions, highest_wpm.max(1.0).round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

/// `mm:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::fixed_test_time;

    fn record(wpm: u32) -> SessionRecord {
        SessionRecord {
            timestamp: fixed_test_time(),
            wpm,
            accuracy: 90,
            loc_per_minute: 3,
            lines_completed: 5,
            time_elapsed_secs: 60,
            total_characters: 40,
            correct_characters: 36,
        }
    }

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 2.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_wpm_points_oldest_first() {
        // history is stored newest first
        let points = wpm_points(&[record(60), record(40), record(50)]);
        assert_eq!(points, vec![(1.0, 50.0), (2.0, 40.0), (3.0, 60.0)]);
        assert_eq!(compute_chart_params(&points), (3.0, 60.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
    }
}
