//! Checklist catalog for site inspections.
//!
//! The catalog is plain data: an ordered list of categories, each holding an
//! ordered list of items. The same catalog drives the inspection form
//! description and answer extraction, so item ids are the only place field
//! names are defined.

use std::collections::HashSet;
use std::path::Path;

use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kind of answer a checklist item expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// One of the catalog's choice options.
    Choice,
    /// A floating-point measurement.
    Number,
    /// Short free text.
    Text,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Choice => write!(f, "choice"),
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A single question on the inspection form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Stable identifier, used as the form field name and answer key.
    pub id: String,
    /// Text shown next to the field.
    pub label: String,
    /// Expected answer kind.
    pub kind: ValueKind,
}

/// A titled group of checklist items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category title.
    pub category: String,
    /// Items in display order.
    pub items: Vec<ChecklistItem>,
}

/// The full inspection checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Options offered for [`ValueKind::Choice`] items.
    #[serde(default = "default_choices")]
    pub choices: Vec<String>,
    /// Categories in display order.
    pub categories: Vec<Category>,
}

fn default_choices() -> Vec<String> {
    vec!["OK".to_string(), "Not OK".to_string(), "N/A".to_string()]
}

type ItemRow = (&'static str, &'static str, ValueKind);

const BUILTIN: &[(&str, &[ItemRow])] = &[
    (
        "Environmental Conditions",
        &[
            (
                "ac_operational",
                "Operating state of each air-conditioning unit (running / standby)",
                ValueKind::Choice,
            ),
            (
                "ambient_temp_c",
                "Ambient temperature reading (°C)",
                ValueKind::Number,
            ),
            (
                "ac_panel_alarms",
                "No alarms showing on the air-conditioning panels",
                ValueKind::Choice,
            ),
            (
                "no_dust_buildup",
                "No accumulation of dust or dirt",
                ValueKind::Choice,
            ),
            (
                "airflow_direction_ok",
                "Airflow direction is correct",
                ValueKind::Choice,
            ),
        ],
    ),
    (
        "Electrical Infrastructure (Panels and Backup)",
        &[
            (
                "ups_status",
                "UPS status (alarms, indicators, runtime)",
                ValueKind::Choice,
            ),
            (
                "panels_breakers",
                "Electrical panels and breakers checked",
                ValueKind::Choice,
            ),
            (
                "pdu_outlet_cables",
                "Cables at power outlets and PDUs checked",
                ValueKind::Choice,
            ),
        ],
    ),
    (
        "Logical Infrastructure (Cabling and Equipment)",
        &[
            (
                "patch_switch_tidy",
                "Patch panels and switches visually checked (cables organized and dressed)",
                ValueKind::Choice,
            ),
            (
                "no_loose_cables",
                "No disconnected or poorly seated cables",
                ValueKind::Choice,
            ),
            (
                "no_cable_strain",
                "No excess tension or sharp bends in cables",
                ValueKind::Choice,
            ),
            (
                "status_leds_ok",
                "Server and switch LEDs show no red or amber alarms",
                ValueKind::Choice,
            ),
        ],
    ),
    (
        "Physical Security",
        &[
            (
                "racks_tidy_covered",
                "Racks checked: order, clearance, covers",
                ValueKind::Choice,
            ),
            (
                "locks_access_points",
                "Locks on racks and data-center doors checked",
                ValueKind::Choice,
            ),
            (
                "entry_log_reviewed",
                "Entry records confirmed in logbook or biometric system",
                ValueKind::Choice,
            ),
            (
                "cameras_working",
                "Security cameras working",
                ValueKind::Choice,
            ),
            (
                "fire_sensors_extinguishers",
                "Smoke/fire sensors and extinguishers checked",
                ValueKind::Choice,
            ),
            ("security_remarks", "Security remarks", ValueKind::Text),
        ],
    ),
];

impl Default for Catalog {
    fn default() -> Self {
        let categories = BUILTIN
            .iter()
            .map(|(title, items)| Category {
                category: (*title).to_string(),
                items: items
                    .iter()
                    .map(|(id, label, kind)| ChecklistItem {
                        id: (*id).to_string(),
                        label: (*label).to_string(),
                        kind: *kind,
                    })
                    .collect(),
            })
            .collect();

        Self {
            choices: default_choices(),
            categories,
        }
    }
}

impl Catalog {
    /// Load a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or fails
    /// [`Catalog::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::catalog(format!(
                "checklist file {} does not exist",
                path.display()
            )));
        }

        let catalog: Catalog = Figment::from(Toml::file(path))
            .extract()
            .map_err(|e| Error::catalog(format!("{}: {e}", path.display())))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load from `path` if given, otherwise use the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured file cannot be loaded.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check that the catalog is usable as an answer schema.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty catalog, blank ids, duplicate ids, or a
    /// choice item with no choice options.
    pub fn validate(&self) -> Result<()> {
        if self.categories.iter().all(|c| c.items.is_empty()) {
            return Err(Error::catalog("catalog has no items"));
        }

        let mut seen = HashSet::new();
        for item in self.items() {
            if item.id.trim().is_empty() {
                return Err(Error::catalog(format!(
                    "item '{}' has a blank id",
                    item.label
                )));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(Error::catalog(format!("duplicate item id '{}'", item.id)));
            }
        }

        if self.choices.is_empty() && self.items().any(|i| i.kind == ValueKind::Choice) {
            return Err(Error::catalog(
                "choice items are defined but no choice options are configured",
            ));
        }

        Ok(())
    }

    /// All items across categories, in catalog order.
    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    /// Look up an item by id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ChecklistItem> {
        self.items().find(|i| i.id == id)
    }

    /// Total number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Whether the catalog has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
