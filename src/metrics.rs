/// Words credited per completed line of code. Code is not prose, so WPM is a
/// normalized proxy rather than a literal word count.
pub const WORDS_PER_LINE: u32 = 8;

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

fn minutes(elapsed_secs: u64) -> f64 {
    elapsed_secs as f64 / 60.0
}

/// Rounded percentage of correct characters over accounting events.
pub fn accuracy(correct_characters: u32, total_keystrokes: u32) -> u32 {
    if total_keystrokes == 0 {
        return 0;
    }
    (correct_characters as f64 / total_keystrokes as f64 * 100.0).round() as u32
}

pub fn wpm(elapsed_secs: u64, lines_completed: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    (f64::from(lines_completed) * f64::from(WORDS_PER_LINE) / minutes(elapsed_secs)).round() as u32
}

pub fn loc_per_minute(elapsed_secs: u64, lines_completed: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    (lines_completed as f64 / minutes(elapsed_secs)).round() as u32
}

pub fn characters_per_second(elapsed_secs: u64, correct_characters: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    (correct_characters as f64 / elapsed_secs as f64).round() as u32
}

/// Score in `0..=100` derived from the coefficient of variation of WPM
/// samples. Fewer than two samples, or a zero mean, count as fully consistent.
pub fn consistency_score(wpm_samples: &[f64]) -> u32 {
    if wpm_samples.len() < 2 {
        return 100;
    }
    match (mean(wpm_samples), std_dev(wpm_samples)) {
        (Some(avg), Some(sd)) if avg > 0.0 => (100.0 - sd / avg * 100.0).max(0.0).round() as u32,
        _ => 100,
    }
}
