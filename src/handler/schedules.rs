use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{db::is_unique_violation, scheduledb::ScheduleExt, userdb::UserExt},
    dtos::scheduledtos::{CreateScheduleDto, ScheduleEntryDto, ScheduleQuery, UpdateScheduleDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::schedulemodel::{entries_for_date, ProviderSchedule},
    AppState,
};

async fn load_own_entry(
    app_state: &AppState,
    entry_id: Uuid,
    user: &JWTAuthMiddeware,
) -> Result<ProviderSchedule, HttpError> {
    let entry = app_state
        .db_client
        .get_schedule_entry(entry_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Schedule entry not found"))?;

    if entry.provider_id != user.user.id {
        return Err(HttpError::forbidden("You can only manage your own schedule"));
    }
    Ok(entry)
}

fn slot_conflict(e: sqlx::Error) -> HttpError {
    if is_unique_violation(&e) {
        HttpError::conflict("You already have hours set for that day")
    } else {
        HttpError::server_error(e.to_string())
    }
}

pub async fn get_my_schedule(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let entries = app_state
        .db_client
        .get_provider_schedule(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let data: Vec<ScheduleEntryDto> = entries.iter().map(ScheduleEntryDto::from).collect();
    Ok(Json(json!({ "status": "success", "data": data })))
}

pub async fn get_provider_schedule(
    Path(provider_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let provider = app_state
        .db_client
        .get_user(Some(provider_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .filter(|user| user.is_provider())
        .ok_or_else(|| HttpError::not_found("Provider not found"))?;

    let entries = app_state
        .db_client
        .get_provider_schedule(provider.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let data: Vec<ScheduleEntryDto> = match query.date {
        Some(date) => entries_for_date(&entries, date)
            .into_iter()
            .map(ScheduleEntryDto::from)
            .collect(),
        None => entries.iter().map(ScheduleEntryDto::from).collect(),
    };

    Ok(Json(json!({ "status": "success", "data": data })))
}

pub async fn create_schedule_entry(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateScheduleDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let entry = app_state
        .db_client
        .create_schedule_entry(user.user.id, body.into())
        .await
        .map_err(slot_conflict)?;

    tracing::info!(
        "provider {} set hours for {}",
        user.user.id,
        entry
            .date_override
            .map(|date| date.to_string())
            .unwrap_or_else(|| entry.day_name().to_string())
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": ScheduleEntryDto::from(&entry) })),
    ))
}

pub async fn update_schedule_entry(
    Path(entry_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateScheduleDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let entry = load_own_entry(&app_state, entry_id, &user).await?;
    body.check_against(&entry).map_err(|e| HttpError::bad_request(e.to_string()))?;

    let updated = app_state
        .db_client
        .update_schedule_entry(entry.id, body.into())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": ScheduleEntryDto::from(&updated) })))
}

pub async fn delete_schedule_entry(
    Path(entry_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let entry = load_own_entry(&app_state, entry_id, &user).await?;

    app_state
        .db_client
        .delete_schedule_entry(entry.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}
