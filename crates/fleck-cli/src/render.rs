use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// `2026-03-01T09:30:12.5Z` → `2026-03-01 09:30`. Anything unparsable is
/// returned as-is.
pub fn short_time(ts: &str) -> String {
    match OffsetDateTime::parse(ts, &Rfc3339) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute()
        ),
        Err(_) => ts.to_string(),
    }
}

/// Cut `s` to at most `width` characters, marking the cut with `…`.
pub fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
