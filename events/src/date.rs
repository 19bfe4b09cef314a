use chrono::NaiveDate;
use std::cmp::Reverse;

use crate::ResolvedEvent;

const MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Parse dates written like `"17 de Maio, 2025"` or `"17 de maio de 2025"`.
/// Anything else maps to 1970-01-01, which sorts after every real event.
pub fn parse_event_date(date: &str) -> NaiveDate {
    parse_parts(date).unwrap_or_else(epoch)
}

fn parse_parts(date: &str) -> Option<NaiveDate> {
    let cleaned = date.to_lowercase().replace(',', " ");
    let parts: Vec<&str> = cleaned.split_whitespace().filter(|p| *p != "de").collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.parse().ok()?;
    let month = MONTHS.iter().position(|m| m == month)? as u32 + 1;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Newest event first; unparseable dates go last. Ties keep authored order.
pub fn sort_newest_first(events: &[ResolvedEvent]) -> Vec<ResolvedEvent> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|e| Reverse(parse_event_date(&e.date)));
    sorted
}
