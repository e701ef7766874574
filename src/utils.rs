pub const DEFAULT_REPS: u32 = 10;

/// First integer found in a rep descriptor ("8-10" -> 8), or
/// [`DEFAULT_REPS`] when there is none.
pub fn parse_reps(descriptor: &str) -> u32 {
    descriptor
        .split(|c: char| !c.is_ascii_digit())
        .find(|tok| !tok.is_empty())
        .and_then(|tok| tok.parse::<u32>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_REPS)
}

/// Lowercase, dash-separated identifier built from a display name.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

pub fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Weight without a trailing ".0" for whole numbers.
pub fn format_weight(weight: f32) -> String {
    if weight.fract() == 0.0 {
        format!("{}kg", weight as i64)
    } else {
        format!("{:.1}kg", weight)
    }
}

/// Printable width of a string, ignoring ANSI colour escapes.
pub fn plain_len(s: &str) -> usize {
    let mut n = 0;
    let mut esc = false;
    for b in s.bytes() {
        match (esc, b) {
            (true, b'm') => esc = false,
            (true, _) => {}
            (false, 0x1B) => esc = true,
            (false, _) => n += 1,
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rep_descriptor_parsing() {
        assert_eq!(parse_reps("8-10"), 8);
        assert_eq!(parse_reps("12"), 12);
        assert_eq!(parse_reps("AMRAP"), 10);
        assert_eq!(parse_reps("  x15 each side"), 15);
        assert_eq!(parse_reps(""), 10);
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Bench Press (Barbell)"), "bench-press-barbell");
        assert_eq!(slugify("  Push A "), "push-a");
        assert_eq!(slugify("!!"), "");
    }

    #[test]
    fn weights_and_widths() {
        assert_eq!(format_weight(80.0), "80kg");
        assert_eq!(format_weight(82.5), "82.5kg");
        assert_eq!(plain_len("\x1b[1mabc\x1b[0m"), 3);
        assert_eq!(format_duration(chrono::Duration::seconds(3725)), "01:02:05");
    }
}
