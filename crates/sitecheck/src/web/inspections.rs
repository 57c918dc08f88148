use axum::{
    extract::{
        rejection::{FormRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Form, Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::catalog::Catalog;
use crate::error::Error;
use crate::form::FormFields;
use crate::record::Inspection;
use crate::service::InspectionForm;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/inspections", get(list_inspections).post(create_inspection))
        .route("/inspections/new", get(new_inspection))
        .route("/inspections/{id}", get(get_inspection))
}

#[derive(Debug, Deserialize)]
struct SiteQuery {
    site: Option<String>,
}

#[derive(Debug, Serialize)]
struct InspectionDetail<'a> {
    inspection: Inspection,
    answered: usize,
    /// Answer ids the current checklist no longer has.
    retired_items: Vec<String>,
    checklist: &'a Catalog,
}

impl<'a> InspectionDetail<'a> {
    fn new(inspection: Inspection, checklist: &'a Catalog) -> Self {
        let retired_items = inspection
            .answers
            .keys()
            .filter(|id| checklist.item(id).is_none())
            .cloned()
            .collect();
        Self {
            answered: inspection.answered_count(),
            retired_items,
            inspection,
            checklist,
        }
    }
}

async fn list_inspections(
    State(svc): State<AppState>,
    query: Result<Query<SiteQuery>, QueryRejection>,
) -> Result<Json<Vec<Inspection>>, ApiError> {
    let Query(q) = query?;
    Ok(Json(svc.list_inspections(q.site.as_deref())?))
}

async fn new_inspection(
    State(svc): State<AppState>,
    query: Result<Query<SiteQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(q) = query?;
    let form: InspectionForm<'_> =
        svc.inspection_form(q.site.as_deref(), Local::now().naive_local());
    Ok(Json(serde_json::to_value(form).map_err(Error::from)?))
}

async fn create_inspection(
    State(svc): State<AppState>,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<(StatusCode, Json<Inspection>), ApiError> {
    let Form(fields) = form?;
    match svc.create_inspection(&fields) {
        Ok(inspection) => Ok((StatusCode::CREATED, Json(inspection))),
        Err(err) => Err(ApiError::from(err).with_input(fields)),
    }
}

async fn get_inspection(
    State(svc): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(id) = id?;
    let detail = InspectionDetail::new(svc.get_inspection(id)?, svc.catalog());
    Ok(Json(serde_json::to_value(detail).map_err(Error::from)?))
}
