//! Moment-style date templates for the legacy date-dependent homepage kind.
//!
//! Text inside `[brackets]` is copied verbatim; recognised tokens are replaced
//! by date parts; every other character passes through unchanged. Locale
//! dependent tokens use English names and US week numbering (weeks start on
//! Sunday, the week containing January 1st is week 1).

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Weekday};

const TOKENS: [&str; 38] = [
    "YYYY", "MMMM", "DDDD", "dddd", "gggg", "GGGG", "MMM", "DDD", "ddd", "YY", "MM", "Do", "DD",
    "dd", "ww", "WW", "HH", "hh", "kk", "mm", "ss", "Q", "M", "D", "d", "E", "e", "w", "W", "H",
    "h", "k", "m", "s", "A", "a", "X", "x",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub fn format<Tz: TimeZone>(at: &DateTime<Tz>, template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }

        if let Some(token) = TOKENS.iter().find(|token| rest.starts_with(**token)) {
            out.push_str(&render(at, token));
            rest = &rest[token.len()..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn render<Tz: TimeZone>(at: &DateTime<Tz>, token: &str) -> String {
    let weekday = at.weekday().num_days_from_sunday() as usize;
    let hour12 = match at.hour() % 12 {
        0 => 12,
        h => h,
    };

    match token {
        "YYYY" => format!("{:04}", at.year()),
        "YY" => format!("{:02}", at.year().rem_euclid(100)),
        "Q" => ((at.month0() / 3) + 1).to_string(),
        "M" => at.month().to_string(),
        "MM" => format!("{:02}", at.month()),
        "MMM" => MONTHS[at.month0() as usize][..3].to_string(),
        "MMMM" => MONTHS[at.month0() as usize].to_string(),
        "D" => at.day().to_string(),
        "DD" => format!("{:02}", at.day()),
        "Do" => ordinal(at.day()),
        "DDD" => at.ordinal().to_string(),
        "DDDD" => format!("{:03}", at.ordinal()),
        "d" | "e" => weekday.to_string(),
        "dd" => WEEKDAYS[weekday][..2].to_string(),
        "ddd" => WEEKDAYS[weekday][..3].to_string(),
        "dddd" => WEEKDAYS[weekday].to_string(),
        "E" => at.weekday().number_from_monday().to_string(),
        "w" => locale_week(at.date_naive()).1.to_string(),
        "ww" => format!("{:02}", locale_week(at.date_naive()).1),
        "gggg" => format!("{:04}", locale_week(at.date_naive()).0),
        "W" => at.iso_week().week().to_string(),
        "WW" => format!("{:02}", at.iso_week().week()),
        "GGGG" => format!("{:04}", at.iso_week().year()),
        "H" => at.hour().to_string(),
        "HH" => format!("{:02}", at.hour()),
        "h" => hour12.to_string(),
        "hh" => format!("{hour12:02}"),
        "k" => (at.hour() + 1).to_string(),
        "kk" => format!("{:02}", at.hour() + 1),
        "m" => at.minute().to_string(),
        "mm" => format!("{:02}", at.minute()),
        "s" => at.second().to_string(),
        "ss" => format!("{:02}", at.second()),
        "A" => (if at.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if at.hour() < 12 { "am" } else { "pm" }).to_string(),
        "X" => at.timestamp().to_string(),
        "x" => at.timestamp_millis().to_string(),
        other => other.to_string(),
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Week-year and week number with Sunday-start weeks. A week belongs to the
/// year its Saturday falls in.
fn locale_week(date: NaiveDate) -> (i32, u32) {
    let to_saturday = Weekday::Sat.num_days_from_sunday() - date.weekday().num_days_from_sunday();
    let saturday = date + Duration::days(i64::from(to_saturday));
    (saturday.year(), (saturday.ordinal() - 1) / 7 + 1)
}

#[cfg(test)]
#[path = "tests/moment_tests.rs"]
mod tests;
