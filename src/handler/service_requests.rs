use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{requestdb::ServiceRequestExt, userdb::UserExt},
    dtos::requestdtos::{
        AssignProviderDto, CreateServiceRequestDto, ServiceRequestDto, UpdateRequestStatusDto,
        UpdateServiceRequestDto,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{requestmodel::ServiceRequest, usermodel::AccountType},
    AppState,
};

pub fn service_requests_handler() -> Router {
    Router::new()
        .route("/", get(list_requests))
        .route(
            "/",
            post(create_request).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![AccountType::Client])
            })),
        )
        .route(
            "/:request_id",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/:request_id/status", put(update_request_status))
        .route("/:request_id/assign", put(assign_provider))
}

async fn load_request(app_state: &AppState, request_id: Uuid) -> Result<ServiceRequest, HttpError> {
    app_state
        .db_client
        .get_service_request(request_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Service request not found"))
}

async fn load_own_request(
    app_state: &AppState,
    request_id: Uuid,
    user: &JWTAuthMiddeware,
) -> Result<ServiceRequest, HttpError> {
    let request = load_request(app_state, request_id).await?;
    if request.client_id != user.user.id {
        return Err(HttpError::forbidden(
            "Only the client who posted this request can change it",
        ));
    }
    Ok(request)
}

pub fn can_view(request: &ServiceRequest, user_id: Uuid, is_provider: bool) -> bool {
    request.client_id == user_id || (is_provider && request.is_visible_to_provider(user_id))
}

pub async fn list_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let requests = if user.user.is_provider() {
        app_state
            .db_client
            .get_provider_service_requests(user.user.id)
            .await
    } else {
        app_state
            .db_client
            .get_client_service_requests(user.user.id)
            .await
    }
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let requests: Vec<ServiceRequestDto> = requests.into_iter().map(Into::into).collect();

    Ok(Json(json!({
        "status": "success",
        "results": requests.len(),
        "data": requests
    })))
}

pub async fn create_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateServiceRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let request = app_state
        .db_client
        .create_service_request(body.into_new_request(user.user.id))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("client {} posted service request {}", user.user.id, request.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": ServiceRequestDto::from(request) })),
    ))
}

pub async fn get_request(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let request = load_request(&app_state, request_id).await?;
    if !can_view(&request, user.user.id, user.user.is_provider()) {
        return Err(HttpError::not_found("Service request not found"));
    }

    Ok(Json(json!({ "status": "success", "data": ServiceRequestDto::from(request) })))
}

pub async fn update_request(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateServiceRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let request = load_own_request(&app_state, request_id, &user).await?;

    let updated = app_state
        .db_client
        .update_service_request(request.id, body.into())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": ServiceRequestDto::from(updated) })))
}

pub async fn update_request_status(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateRequestStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let request = load_request(&app_state, request_id).await?;
    let is_owner = request.client_id == user.user.id;
    let is_assignee = request.assigned_provider_id == Some(user.user.id);
    if !is_owner && !is_assignee {
        return Err(HttpError::forbidden(
            "Only the client or the assigned provider can change this request",
        ));
    }

    let updated = app_state
        .db_client
        .update_service_request_status(request.id, body.status)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": ServiceRequestDto::from(updated) })))
}

pub async fn assign_provider(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<AssignProviderDto>,
) -> Result<impl IntoResponse, HttpError> {
    let request = load_own_request(&app_state, request_id, &user).await?;

    let provider = app_state
        .db_client
        .get_user(Some(body.provider_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Provider not found"))?;
    if !provider.is_provider() {
        return Err(HttpError::bad_request("Requests can only be assigned to providers"));
    }

    let updated = app_state
        .db_client
        .assign_service_request(request.id, provider.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": ServiceRequestDto::from(updated) })))
}

pub async fn delete_request(
    Path(request_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let request = load_own_request(&app_state, request_id, &user).await?;

    app_state
        .db_client
        .delete_service_request(request.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::requestmodel::{RequestStatus, Urgency};
    use chrono::Utc;

    fn open_request(client_id: Uuid) -> ServiceRequest {
        let now = Utc::now();
        ServiceRequest {
            id: Uuid::new_v4(),
            client_id,
            category_id: Uuid::new_v4(),
            title: "Paint two rooms".into(),
            description: "Interior walls".into(),
            budget_min: None,
            budget_max: None,
            location: "Nakuru".into(),
            preferred_date: None,
            urgency: Urgency::Low,
            status: RequestStatus::Open,
            assigned_provider_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn open_requests_are_visible_to_any_provider() {
        let client = Uuid::new_v4();
        let provider = Uuid::new_v4();
        let request = open_request(client);

        assert!(can_view(&request, client, false));
        assert!(can_view(&request, provider, true));
        assert!(!can_view(&request, Uuid::new_v4(), false));
    }

    #[test]
    fn assigned_requests_are_visible_only_to_the_assignee() {
        let client = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let mut request = open_request(client);
        request.status = RequestStatus::Assigned;
        request.assigned_provider_id = Some(assignee);

        assert!(can_view(&request, assignee, true));
        assert!(!can_view(&request, Uuid::new_v4(), true));
    }
}
