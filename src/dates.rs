//! Resolves free-text time references into a concrete month window.
//!
//! Resolution never fails: relative phrases win first, then month names by
//! leftmost occurrence in the query, then a 4-digit year; whatever is still
//! missing gets a deterministic default (January, current year).

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// A resolved `(month, year)` pair. Always valid, never empty, so fetch
/// logic downstream never special-cases "no date given".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    pub month: u32,
    pub year: i32,
}

impl ResolvedWindow {
    /// First and last day of the calendar month, leap years included.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1).expect("valid year"));
        let next_month = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(start);
        (start, end)
    }

    /// Stable `YYYY-MM` label, matching monthly-breakdown keys.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

const MONTH_NAMES: [(&str, u32); 24] = [
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

/// Resolve a query's time reference against `now`.
///
/// Relative phrases are checked first; otherwise the leftmost whole-word
/// month name in the query wins (not the first table entry), and a 4-digit
/// year starting with "20" is extracted if present.
pub fn resolve(query: &str, now: NaiveDate) -> ResolvedWindow {
    let lowered = query.to_lowercase();

    if lowered.contains("this month") {
        return ResolvedWindow {
            month: now.month(),
            year: now.year(),
        };
    }
    if lowered.contains("last month") {
        let (month, year) = if now.month() == 1 {
            (12, now.year() - 1)
        } else {
            (now.month() - 1, now.year())
        };
        return ResolvedWindow { month, year };
    }
    if lowered.contains("this year") {
        return ResolvedWindow {
            month: 1,
            year: now.year(),
        };
    }
    if lowered.contains("last year") {
        return ResolvedWindow {
            month: 1,
            year: now.year() - 1,
        };
    }

    let month = leftmost_month(&lowered).unwrap_or(1);
    let year = extract_year(&lowered).unwrap_or_else(|| now.year());
    ResolvedWindow { month, year }
}

/// Leftmost whole-word month name or abbreviation in the query. Longer
/// names are preferred at equal positions so "september" is not read as
/// "sep" plus trailing letters.
fn leftmost_month(lowered: &str) -> Option<u32> {
    let mut best: Option<(usize, usize, u32)> = None;
    for (name, number) in MONTH_NAMES {
        for (position, _) in lowered.match_indices(name) {
            if !is_whole_word(lowered, position, name.len()) {
                continue;
            }
            let candidate = (position, name.len(), number);
            best = match best {
                None => Some(candidate),
                Some((pos, len, _)) if position < pos || (position == pos && name.len() > len) => {
                    Some(candidate)
                }
                other => other,
            };
        }
    }
    best.map(|(_, _, number)| number)
}

fn is_whole_word(text: &str, start: usize, len: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[start + len..].chars().next();
    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}

/// First `20xx` 4-digit run in the query.
fn extract_year(lowered: &str) -> Option<i32> {
    let bytes = lowered.as_bytes();
    for start in 0..bytes.len().saturating_sub(3) {
        if bytes[start] == b'2'
            && bytes[start + 1] == b'0'
            && bytes[start + 2].is_ascii_digit()
            && bytes[start + 3].is_ascii_digit()
        {
            return lowered[start..start + 4].parse().ok();
        }
    }
    None
}
