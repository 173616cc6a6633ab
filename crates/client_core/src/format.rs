//! Display helpers shared by the bill list and the submission form.

use chrono::{DateTime, Datelike, NaiveDate};
use shared::domain::BillStatus;

const SHORT_MONTHS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jui", "Jui", "Aoû", "Sep", "Oct", "Nov", "Déc",
];

const RECEIPT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Outcome of formatting a stored date. A value that cannot be parsed is kept
/// as-is so the row can still be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedDate {
    Formatted { date: NaiveDate, display: String },
    RawFallback { raw: String },
}

impl FormattedDate {
    pub fn display(&self) -> &str {
        match self {
            Self::Formatted { display, .. } => display,
            Self::RawFallback { raw } => raw,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Formatted { date, .. } => Some(*date),
            Self::RawFallback { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Warning,
    Success,
    Danger,
    Neutral,
}

/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and RFC 3339 timestamps.
pub fn parse_bill_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

/// `2004-04-04` becomes `4 Avr. 04`.
pub fn format_date(raw: &str) -> FormattedDate {
    match parse_bill_date(raw) {
        Some(date) => FormattedDate::Formatted {
            display: format!(
                "{} {}. {:02}",
                date.day(),
                SHORT_MONTHS[date.month0() as usize],
                date.year().rem_euclid(100)
            ),
            date,
        },
        None => FormattedDate::RawFallback {
            raw: raw.to_string(),
        },
    }
}

pub fn format_status(status: &BillStatus) -> &str {
    match status {
        BillStatus::Pending => "En attente",
        BillStatus::Accepted => "Accepté",
        BillStatus::Refused => "Refused",
        BillStatus::Other(raw) => raw,
    }
}

pub fn status_badge(status: &BillStatus) -> BadgeTone {
    match status {
        BillStatus::Pending => BadgeTone::Warning,
        BillStatus::Accepted => BadgeTone::Success,
        BillStatus::Refused => BadgeTone::Danger,
        BillStatus::Other(_) => BadgeTone::Neutral,
    }
}

pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) if value.fract() == 0.0 => format!("{value:.0} €"),
        Some(value) => format!("{value} €"),
        None => "-".to_string(),
    }
}

/// Case-insensitive check of the receipt extension against jpg, jpeg and png.
pub fn is_allowed_receipt(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| {
            RECEIPT_EXTENSIONS
                .iter()
                .any(|allowed| extension.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
