//! Record service: the operations behind every form and list view.
//!
//! A [`RecordService`] is built once at startup from an opened [`Storage`]
//! handle and the checklist [`Catalog`], then shared by all request
//! handlers.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::form::{self, FormFields, TIME_FORMAT};
use crate::record::{Inspection, Permit, Shift};
use crate::storage::{InspectionFilter, PermitFilter, Storage};

/// Completion state of one shift at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftStatus {
    /// The shift.
    pub shift: Shift,
    /// Whether an inspection was recorded.
    pub done: bool,
}

/// Completion state of every shift at one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteStatus {
    /// Site code.
    pub site: String,
    /// One entry per shift, in shift order.
    pub shifts: Vec<ShiftStatus>,
}

/// Which site/shift inspections exist for a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStatus {
    /// The day reported on.
    pub date: NaiveDate,
    /// One entry per configured site, in configuration order.
    pub sites: Vec<SiteStatus>,
}

impl DayStatus {
    /// Whether the site/shift pair has an inspection. Unknown sites report `false`.
    #[must_use]
    pub fn is_done(&self, site: &str, shift: Shift) -> bool {
        self.sites
            .iter()
            .filter(|s| s.site == site)
            .flat_map(|s| s.shifts.iter())
            .any(|s| s.shift == shift && s.done)
    }

    /// Number of site/shift pairs still without an inspection.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sites
            .iter()
            .flat_map(|s| s.shifts.iter())
            .filter(|s| !s.done)
            .count()
    }
}

/// Everything needed to render a new-inspection form.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionForm<'a> {
    /// Preselected date.
    pub date: NaiveDate,
    /// Preselected site.
    pub site: Option<&'a str>,
    /// Preselected shift.
    pub shift: Shift,
    /// Selectable sites.
    pub sites: &'a [String],
    /// Selectable shifts.
    pub shifts: [Shift; 2],
    /// The checklist to render.
    pub checklist: &'a Catalog,
}

/// Defaults for a new-permit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermitForm {
    /// Preselected entry date.
    pub date: NaiveDate,
    /// Preselected entry time, `HH:MM`.
    pub time: String,
}

/// Create and read operations for inspections and permits.
#[derive(Debug, Clone)]
pub struct RecordService {
    storage: Arc<Storage>,
    catalog: Arc<Catalog>,
    sites: Vec<String>,
    list_limit: usize,
}

impl RecordService {
    /// Build a service over an open storage handle.
    #[must_use]
    pub fn new(storage: Arc<Storage>, catalog: Catalog, config: &Config) -> Self {
        Self {
            storage,
            catalog: Arc::new(catalog),
            sites: config.inspection.sites.clone(),
            list_limit: config.storage.list_limit,
        }
    }

    /// Open the configured database and checklist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the checklist
    /// cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = Catalog::load_or_default(config.inspection.checklist_path.as_deref())?;
        let storage = Storage::open(config.database_path())?;
        Ok(Self::new(Arc::new(storage), catalog, config))
    }

    /// The checklist catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Configured site codes.
    #[must_use]
    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    /// The underlying storage handle.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Validate and store a submitted inspection form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad site, date or shift and
    /// [`Error::ConstraintViolation`] if the site/date/shift is already recorded.
    pub fn create_inspection(&self, fields: &FormFields) -> Result<Inspection> {
        let new = form::map_inspection(&self.catalog, &self.sites, fields)
            .inspect_err(|e| warn!("Rejected inspection submission: {e}"))?;
        let inspection = self
            .storage
            .insert_inspection(&new)
            .inspect_err(|e| warn!("Inspection not saved: {e}"))?;
        info!(
            "Recorded inspection {} for {} {} {}",
            inspection.id, inspection.site, inspection.date, inspection.shift
        );
        Ok(inspection)
    }

    /// Validate and store a submitted permit form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the visitor name is blank.
    pub fn create_permit(&self, fields: &FormFields) -> Result<Permit> {
        let new =
            form::map_permit(fields).inspect_err(|e| warn!("Rejected permit submission: {e}"))?;
        let permit = self.storage.insert_permit(&new)?;
        info!("Recorded permit {} for {}", permit.id, permit.details.name);
        Ok(permit)
    }

    /// Fetch one inspection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no inspection has this id.
    pub fn get_inspection(&self, id: i64) -> Result<Inspection> {
        self.storage.get_inspection(id)?.ok_or(Error::NotFound {
            kind: "inspection",
            id,
        })
    }

    /// Fetch one permit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no permit has this id.
    pub fn get_permit(&self, id: i64) -> Result<Permit> {
        self.storage
            .get_permit(id)?
            .ok_or(Error::NotFound { kind: "permit", id })
    }

    /// Newest inspections, optionally for a single site.
    ///
    /// A site that is not configured is ignored and all sites are listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_inspections(&self, site: Option<&str>) -> Result<Vec<Inspection>> {
        let filter = InspectionFilter {
            site: site
                .filter(|s| self.sites.iter().any(|known| known == s))
                .map(str::to_string),
            date: None,
        };
        self.storage.list_inspections(&filter, self.list_limit)
    }

    /// Newest permits.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_permits(&self) -> Result<Vec<Permit>> {
        self.storage
            .list_permits(&PermitFilter::default(), self.list_limit)
    }

    /// Every inspection matching the filter, without the list cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn export_inspections(&self, filter: &InspectionFilter) -> Result<Vec<Inspection>> {
        self.storage.list_inspections(filter, usize::MAX)
    }

    /// Every permit matching the filter, without the list cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn export_permits(&self, filter: &PermitFilter) -> Result<Vec<Permit>> {
        self.storage.list_permits(filter, usize::MAX)
    }

    /// Site/shift completion for the local current day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn today_status(&self) -> Result<DayStatus> {
        self.status_on(Local::now().date_naive())
    }

    /// Site/shift completion for a given day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn status_on(&self, date: NaiveDate) -> Result<DayStatus> {
        let sites = self
            .sites
            .iter()
            .map(|site| -> Result<SiteStatus> {
                let shifts = Shift::ALL
                    .iter()
                    .map(|&shift| -> Result<ShiftStatus> {
                        let done = self.storage.inspection_exists(site, date, shift)?;
                        Ok(ShiftStatus { shift, done })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(SiteStatus {
                    site: site.clone(),
                    shifts,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DayStatus { date, sites })
    }

    /// Defaults for a new inspection form opened at `now` (local time).
    #[must_use]
    pub fn inspection_form(
        &self,
        requested_site: Option<&str>,
        now: NaiveDateTime,
    ) -> InspectionForm<'_> {
        InspectionForm {
            date: now.date(),
            site: form::default_site(&self.sites, requested_site),
            shift: Shift::for_hour(now.hour()),
            sites: &self.sites,
            shifts: Shift::ALL,
            checklist: &self.catalog,
        }
    }

    /// Defaults for a new permit form opened at `now` (local time).
    #[must_use]
    pub fn permit_form(&self, now: NaiveDateTime) -> PermitForm {
        PermitForm {
            date: now.date(),
            time: now.format(TIME_FORMAT).to_string(),
        }
    }
}
