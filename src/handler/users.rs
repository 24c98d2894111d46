use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        businessdb::BusinessProfileExt, db::is_unique_violation, notificationdb::NotificationExt,
        orderdb::OrderExt, servicedb::ServiceExt, userdb::UserExt,
    },
    dtos::{
        userdtos::{
            AccountTypeUpdateDto, BusinessProfileDto, CreateBusinessProfileDto, DashboardDto,
            FilterUserDto, PublicUserDto, UpdateBusinessProfileDto, UpdateProfileDto, UserData,
            UserListResponseDto, UserResponseDto,
        },
        RequestQueryDto,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware, PROVIDER_ROLES},
    models::usermodel::AccountType,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/", get(get_users))
        .route("/me", get(get_me).put(update_profile))
        .route("/me/account-type", put(update_account_type))
        .route(
            "/me/business-profile",
            get(get_my_business_profile)
                .post(create_business_profile)
                .put(update_business_profile)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![AccountType::Business])
                })),
        )
        .route(
            "/dashboard/provider",
            get(provider_dashboard).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, PROVIDER_ROLES.to_vec())
            })),
        )
        .route(
            "/dashboard/client",
            get(client_dashboard).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![AccountType::Client])
            })),
        )
        .route("/:user_id", get(get_user))
        .route("/:user_id/business-profile", get(get_business_profile))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user.user),
        },
    }))
}

pub async fn get_users(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate()?;

    let users = app_state
        .db_client
        .get_users(query_params.limit() as i64, query_params.offset())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user_count = app_state
        .db_client
        .get_user_count()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        users: FilterUserDto::filter_users(&users),
        results: user_count,
    }))
}

pub async fn get_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(json!({
        "status": "success",
        "data": PublicUserDto::from(&user)
    })))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let updated = app_state
        .db_client
        .update_user_profile(
            user.user.id,
            body.first_name,
            body.last_name,
            body.phone_number,
            body.bio,
            body.profile_picture,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    }))
}

pub async fn update_account_type(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<AccountTypeUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    if user.user.account_type == body.account_type {
        return Err(HttpError::bad_request(format!(
            "Account is already a {} account",
            body.account_type.to_str()
        )));
    }

    let updated = app_state
        .db_client
        .update_account_type(user.user.id, body.account_type)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(
        "user {} switched to {} account",
        updated.id,
        updated.account_type.to_str()
    );

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    }))
}

pub async fn get_my_business_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_business_profile(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("You have not created a business profile"))?;

    Ok(Json(json!({
        "status": "success",
        "data": BusinessProfileDto::new(profile, &user.user)
    })))
}

pub async fn get_business_profile(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let owner = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    let profile = app_state
        .db_client
        .get_business_profile(owner.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Business profile not found"))?;

    Ok(Json(json!({
        "status": "success",
        "data": BusinessProfileDto::new(profile, &owner)
    })))
}

pub async fn create_business_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateBusinessProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let profile = app_state
        .db_client
        .create_business_profile(user.user.id, body.into())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::conflict("Business profile already exists")
            } else {
                HttpError::server_error(e.to_string())
            }
        })?;

    tracing::info!("user {} registered business {}", user.user.id, profile.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": BusinessProfileDto::new(profile, &user.user)
        })),
    ))
}

pub async fn update_business_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateBusinessProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let profile = app_state
        .db_client
        .update_business_profile(user.user.id, body.into())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("You have not created a business profile"))?;

    Ok(Json(json!({
        "status": "success",
        "data": BusinessProfileDto::new(profile, &user.user)
    })))
}

pub async fn provider_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .db_client
        .get_order_stats(user.user.id, true)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let services = app_state
        .db_client
        .get_provider_services(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let unread = unread_count(&app_state, &user).await?;

    Ok(Json(json!({
        "status": "success",
        "data": DashboardDto {
            account_type: user.user.account_type,
            stats,
            services_count: Some(services.len()),
            unread_notifications: unread,
        }
    })))
}

pub async fn client_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .db_client
        .get_order_stats(user.user.id, false)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let unread = unread_count(&app_state, &user).await?;

    Ok(Json(json!({
        "status": "success",
        "data": DashboardDto {
            account_type: user.user.account_type,
            stats,
            services_count: None,
            unread_notifications: unread,
        }
    })))
}

async fn unread_count(app_state: &AppState, user: &JWTAuthMiddeware) -> Result<i64, HttpError> {
    app_state
        .db_client
        .get_unread_count(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))
}
