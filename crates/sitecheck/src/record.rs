//! Core record types for sitecheck.
//!
//! This module defines the two persisted record kinds, inspections and
//! visitor permits, along with the unsaved `New*` forms the mapper produces.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The recurring time window an inspection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    /// Before noon.
    Morning,
    /// Noon onwards.
    Afternoon,
}

impl Shift {
    /// All shifts in display order.
    pub const ALL: [Shift; 2] = [Shift::Morning, Shift::Afternoon];

    /// The stored and displayed label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
        }
    }

    /// The shift suggested for a form opened at the given local hour.
    #[must_use]
    pub fn for_hour(hour: u32) -> Self {
        if hour < 12 {
            Self::Morning
        } else {
            Self::Afternoon
        }
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Shift {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Morning" => Ok(Self::Morning),
            "Afternoon" => Ok(Self::Afternoon),
            other => Err(Error::invalid_input(
                "shift",
                format!("unknown shift '{other}', expected Morning or Afternoon"),
            )),
        }
    }
}

/// A recorded answer to one checklist item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// A numeric measurement.
    Number(f64),
    /// A choice option or free text, stored exactly as submitted.
    Text(String),
}

/// Answers keyed by checklist item id. `None` means "no answer".
pub type Answers = BTreeMap<String, Option<Answer>>;

/// An inspection ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInspection {
    /// Site code.
    pub site: String,
    /// Calendar day inspected.
    pub date: NaiveDate,
    /// Shift inspected.
    pub shift: Shift,
    /// Checklist answers.
    pub answers: Answers,
    /// Additional remarks.
    pub notes: String,
}

/// A stored inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Site code.
    pub site: String,
    /// Calendar day inspected.
    pub date: NaiveDate,
    /// Shift inspected.
    pub shift: Shift,
    /// Checklist answers.
    pub answers: Answers,
    /// Additional remarks.
    pub notes: String,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

impl Inspection {
    /// The answer recorded for an item, if any.
    #[must_use]
    pub fn answer(&self, item_id: &str) -> Option<&Answer> {
        self.answers.get(item_id).and_then(Option::as_ref)
    }

    /// Number of items that received an answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_some()).count()
    }
}

/// A visitor access permit ready to be stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPermit {
    /// Visitor name.
    pub name: String,
    /// Identity document number.
    pub identification: Option<String>,
    /// Visitor's company.
    pub company: Option<String>,
    /// Reason for the visit.
    pub reason: Option<String>,
    /// Equipment or tools brought in.
    pub equipment: Option<String>,
    /// Planned entry day.
    pub entry_date: Option<NaiveDate>,
    /// Planned entry time.
    pub entry_time: Option<NaiveTime>,
    /// Planned exit day.
    pub exit_date: Option<NaiveDate>,
    /// Planned exit time.
    pub exit_time: Option<NaiveTime>,
    /// Name and role of the person authorizing the visit.
    pub authorizer: String,
    /// Additional remarks.
    pub notes: String,
    /// Provider signature.
    pub provider_signature: String,
    /// Facility manager signature.
    pub manager_signature: String,
    /// Escorting staff signature.
    pub escort_signature: String,
}

/// A stored visitor access permit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Submitted permit fields.
    #[serde(flatten)]
    pub details: NewPermit,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}
