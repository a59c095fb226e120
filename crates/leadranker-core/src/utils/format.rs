use chrono::{DateTime, NaiveDateTime};

/// Format a phone number for display.
/// US numbers are normalized to (XXX) XXX-XXXX, anything else is kept as typed.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = match digits.len() {
        10 => &digits[..],
        11 if digits.starts_with('1') => &digits[1..],
        _ => return phone.trim().to_string(),
    };
    format!("({}) {}-{}", &national[0..3], &national[3..6], &national[6..10])
}

/// Truncate to at most `max_chars` characters, ending in "..." when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        s.chars().take(max_chars).collect()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    }
}

/// Render a backend timestamp as "May 01, 2024 10:00".
///
/// The backend sends RFC 3339 on newer rows and offset-less ISO-8601 on
/// older ones. Unparseable values fall back to their date part.
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%b %d, %Y %H:%M";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DISPLAY).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(DISPLAY).to_string();
        }
    }
    raw.chars().take(10).collect()
}

/// Scores are 0-100; show them without decimals.
pub fn format_score(score: f64) -> String {
    format!("{:.0}", score)
}

/// 1000 -> "1,000"
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone("+1 555 123 4567"), "(555) 123-4567");
        assert_eq!(format_phone("(555) 123-4567"), "(555) 123-4567");
        assert_eq!(format_phone("+44 20 7946 0958"), "+44 20 7946 0958");
        assert_eq!(format_phone("123"), "123");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Ünïcödé text", 6), "Ünï...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2024-05-01T10:00:00"), "May 01, 2024 10:00");
        assert_eq!(format_timestamp("2024-05-01T10:00:00.123456"), "May 01, 2024 10:00");
        assert_eq!(format_timestamp("2024-05-01T10:00:00+00:00"), "May 01, 2024 10:00");
        assert_eq!(format_timestamp("2024-05-01 garbage"), "2024-05-01");
        assert_eq!(format_timestamp(""), "");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(50), "50");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(84.4), "84");
        assert_eq!(format_score(0.0), "0");
    }
}
