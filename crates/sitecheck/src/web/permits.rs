use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Form, Json, Router,
};
use chrono::Local;

use super::{ApiError, AppState};
use crate::form::FormFields;
use crate::record::Permit;
use crate::service::PermitForm;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/permits", get(list_permits).post(create_permit))
        .route("/permits/new", get(new_permit))
        .route("/permits/{id}", get(get_permit))
}

async fn list_permits(State(svc): State<AppState>) -> Result<Json<Vec<Permit>>, ApiError> {
    Ok(Json(svc.list_permits()?))
}

async fn new_permit(State(svc): State<AppState>) -> Json<PermitForm> {
    Json(svc.permit_form(Local::now().naive_local()))
}

async fn create_permit(
    State(svc): State<AppState>,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<(StatusCode, Json<Permit>), ApiError> {
    let Form(fields) = form?;
    match svc.create_permit(&fields) {
        Ok(permit) => Ok((StatusCode::CREATED, Json(permit))),
        Err(err) => Err(ApiError::from(err).with_input(fields)),
    }
}

async fn get_permit(
    State(svc): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Permit>, ApiError> {
    let Path(id) = id?;
    Ok(Json(svc.get_permit(id)?))
}
