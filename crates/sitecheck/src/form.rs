//! Mapping of submitted form fields to typed records.
//!
//! Required fields (inspection site, date and shift, permit name) are
//! validated here, before anything reaches storage. Optional numeric,
//! date and time fields are lenient: unparseable input is stored as
//! "no answer" rather than rejected.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};

use crate::catalog::{Catalog, ValueKind};
use crate::error::{Error, Result};
use crate::record::{Answer, Answers, NewInspection, NewPermit, Shift};

/// Textual date format used by form fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Textual time format used by form fields.
pub const TIME_FORMAT: &str = "%H:%M";

/// Raw submitted form fields.
pub type FormFields = HashMap<String, String>;

/// Build the answer map for an inspection from the catalog.
///
/// Every catalog item gets an entry, `None` when the field was missing or,
/// for numeric items, empty or unparseable.
#[must_use]
pub fn map_answers(catalog: &Catalog, fields: &FormFields) -> Answers {
    catalog
        .items()
        .map(|item| {
            let raw = fields.get(&item.id);
            let answer = match item.kind {
                ValueKind::Number => raw
                    .map(String::as_str)
                    .and_then(parse_number)
                    .map(Answer::Number),
                ValueKind::Choice | ValueKind::Text => raw.cloned().map(Answer::Text),
            };
            (item.id.clone(), answer)
        })
        .collect()
}

/// Map a submitted inspection form.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the site is not one of `sites`, the
/// shift is unknown, or the date is missing or malformed.
pub fn map_inspection(
    catalog: &Catalog,
    sites: &[String],
    fields: &FormFields,
) -> Result<NewInspection> {
    let site = field(fields, "site");
    if site.is_empty() {
        return Err(Error::invalid_input("site", "a site is required"));
    }
    if !sites.iter().any(|s| s == site) {
        return Err(Error::invalid_input(
            "site",
            format!("unknown site '{site}', expected one of {}", sites.join(", ")),
        ));
    }

    let date_raw = field(fields, "date");
    if date_raw.is_empty() {
        return Err(Error::invalid_input("date", "a date is required"));
    }
    let date = parse_date(date_raw).ok_or_else(|| {
        Error::invalid_input("date", format!("'{date_raw}' is not a YYYY-MM-DD date"))
    })?;

    let shift: Shift = field(fields, "shift").parse()?;

    Ok(NewInspection {
        site: site.to_string(),
        date,
        shift,
        answers: map_answers(catalog, fields),
        notes: field(fields, "notes").to_string(),
    })
}

/// Map a submitted permit form.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the visitor name is blank.
pub fn map_permit(fields: &FormFields) -> Result<NewPermit> {
    let name = field(fields, "name");
    if name.is_empty() {
        return Err(Error::invalid_input("name", "a visitor name is required"));
    }

    Ok(NewPermit {
        name: name.to_string(),
        identification: optional(fields, "identification"),
        company: optional(fields, "company"),
        reason: optional(fields, "reason"),
        equipment: optional(fields, "equipment"),
        entry_date: fields.get("entry_date").map(String::as_str).and_then(parse_date),
        entry_time: fields.get("entry_time").map(String::as_str).and_then(parse_time),
        exit_date: fields.get("exit_date").map(String::as_str).and_then(parse_date),
        exit_time: fields.get("exit_time").map(String::as_str).and_then(parse_time),
        authorizer: field(fields, "authorizer").to_string(),
        notes: field(fields, "notes").to_string(),
        provider_signature: field(fields, "provider_signature").to_string(),
        manager_signature: field(fields, "manager_signature").to_string(),
        escort_signature: field(fields, "escort_signature").to_string(),
    })
}

/// Parse a numeric answer. Blank, malformed and non-finite input yield `None`.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a `YYYY-MM-DD` date, `None` on blank or malformed input.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Parse an `HH:MM` time, `None` on blank or malformed input.
#[must_use]
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

/// The site preselected on the inspection form.
///
/// The requested site wins when it is configured; otherwise the first
/// configured site is used.
#[must_use]
pub fn default_site<'a>(sites: &'a [String], requested: Option<&str>) -> Option<&'a str> {
    requested
        .and_then(|r| sites.iter().find(|s| *s == r))
        .or_else(|| sites.first())
        .map(String::as_str)
}

fn field<'a>(fields: &'a FormFields, key: &str) -> &'a str {
    fields.get(key).map_or("", |v| v.trim())
}

fn optional(fields: &FormFields, key: &str) -> Option<String> {
    let value = field(fields, key);
    (!value.is_empty()).then(|| value.to_string())
}
