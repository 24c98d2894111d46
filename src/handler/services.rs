use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{db::is_unique_violation, orderdb::OrderExt, servicedb::ServiceExt},
    dtos::servicedtos::{
        CreatePackageDto, CreateReviewDto, CreateServiceDto, PackageListDto,
        PromotionQuoteDto, PromotionQuoteQuery, ReviewListDto, ServiceDetailDto,
        ServiceSearchQuery, UpdatePackageDto, UpdateServiceDto,
    },
    error::HttpError,
    handler::schedules::{
        create_schedule_entry, delete_schedule_entry, get_my_schedule, get_provider_schedule,
        update_schedule_entry,
    },
    middleware::{auth, role_check, JWTAuthMiddeware, PROVIDER_ROLES},
    models::{
        servicemodel::{Service, ServicePackage},
        usermodel::AccountType,
    },
    service::notification_service::review_notification,
    AppState,
};

pub fn services_handler() -> Router {
    let public_routes = Router::new()
        .route("/", get(search_services))
        .route("/categories", get(get_categories))
        .route("/promotions", get(get_active_promotions))
        .route("/provider/:provider_id", get(get_provider_services))
        .route("/provider/:provider_id/schedule", get(get_provider_schedule))
        .route("/:service_id", get(get_service))
        .route("/:service_id/packages", get(get_packages))
        .route("/:service_id/reviews", get(get_reviews))
        .route("/:service_id/promotion-quote", get(quote_promotion));

    let provider_routes = Router::new()
        .route("/", post(create_service))
        .route(
            "/:service_id",
            axum::routing::put(update_service).delete(delete_service),
        )
        .route("/:service_id/packages", post(create_package))
        .route(
            "/packages/:package_id",
            axum::routing::put(update_package).delete(delete_package),
        )
        .route("/schedule", get(get_my_schedule).post(create_schedule_entry))
        .route(
            "/schedule/:entry_id",
            axum::routing::put(update_schedule_entry).delete(delete_schedule_entry),
        )
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, PROVIDER_ROLES.to_vec())
        }))
        .layer(middleware::from_fn(auth));

    let client_routes = Router::new()
        .route("/favorites", get(get_favorites))
        .route(
            "/:service_id/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/:service_id/reviews",
            post(create_review).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![AccountType::Client])
            })),
        )
        .layer(middleware::from_fn(auth));

    Router::new()
        .merge(public_routes)
        .merge(provider_routes)
        .merge(client_routes)
}

async fn load_service(app_state: &AppState, service_id: Uuid) -> Result<Service, HttpError> {
    app_state
        .db_client
        .get_service(service_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Service not found"))
}

async fn load_owned_service(
    app_state: &AppState,
    service_id: Uuid,
    user: &JWTAuthMiddeware,
) -> Result<Service, HttpError> {
    let service = load_service(app_state, service_id).await?;
    if service.provider_id != user.user.id {
        return Err(HttpError::forbidden("You can only manage your own services"));
    }
    Ok(service)
}

async fn load_owned_package(
    app_state: &AppState,
    package_id: Uuid,
    user: &JWTAuthMiddeware,
) -> Result<ServicePackage, HttpError> {
    let package = app_state
        .db_client
        .get_package(package_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Package not found"))?;
    load_owned_service(app_state, package.service_id, user).await?;
    Ok(package)
}

pub async fn search_services(
    Query(query): Query<ServiceSearchQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;

    let services = app_state
        .db_client
        .search_services(&query.filter(), query.limit(), query.offset())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "results": services.len(),
        "data": services
    })))
}

pub async fn get_categories(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state
        .db_client
        .get_categories()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": categories })))
}

pub async fn get_service(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let service = load_service(&app_state, service_id).await?;
    let rating = app_state
        .db_client
        .get_rating_summary(service.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": ServiceDetailDto::new(service, rating)
    })))
}

pub async fn get_provider_services(
    Path(provider_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let services = app_state
        .db_client
        .get_provider_services(provider_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": services })))
}

pub async fn create_service(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateServiceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    app_state
        .db_client
        .get_category(body.category_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::bad_request("Unknown category"))?;

    let service = app_state
        .db_client
        .create_service(body.into_new_service(user.user.id))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("provider {} listed service {}", user.user.id, service.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": service })),
    ))
}

pub async fn update_service(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateServiceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let service = load_owned_service(&app_state, service_id, &user).await?;

    let updated = app_state
        .db_client
        .update_service(service.id, body.into())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": updated })))
}

pub async fn delete_service(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let service = load_owned_service(&app_state, service_id, &user).await?;

    app_state
        .db_client
        .delete_service(service.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_packages(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let service = load_service(&app_state, service_id).await?;

    let packages = app_state
        .db_client
        .get_service_packages(service.id, false)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": PackageListDto {
            service_id: service.id,
            base_price: service.price,
            packages,
        }
    })))
}

pub async fn create_package(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreatePackageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let service = load_owned_service(&app_state, service_id, &user).await?;

    let package = app_state
        .db_client
        .create_package(service.id, body.into())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("service {} gained package {}", service.id, package.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": package })),
    ))
}

pub async fn update_package(
    Path(package_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdatePackageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let package = load_owned_package(&app_state, package_id, &user).await?;

    let updated = app_state
        .db_client
        .update_package(package.id, body.into())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": updated })))
}

pub async fn delete_package(
    Path(package_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let package = load_owned_package(&app_state, package_id, &user).await?;

    app_state
        .db_client
        .delete_package(package.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_reviews(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let service = load_service(&app_state, service_id).await?;

    let reviews = app_state
        .db_client
        .get_reviews(service.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    let rating = app_state
        .db_client
        .get_rating_summary(service.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "data": ReviewListDto {
            reviews,
            average_rating: rating.average_rating,
            review_count: rating.review_count,
        }
    })))
}

pub async fn create_review(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let service = load_service(&app_state, service_id).await?;

    if service.provider_id == user.user.id {
        return Err(HttpError::bad_request("You cannot review your own service"));
    }

    let is_verified = app_state
        .db_client
        .has_completed_order(user.user.id, service.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let review = app_state
        .db_client
        .create_review(&service, user.user.id, body.rating, body.comment, is_verified)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::conflict("You have already reviewed this service")
            } else {
                HttpError::server_error(e.to_string())
            }
        })?;

    let related_order = app_state
        .db_client
        .get_first_order_id(user.user.id, service.id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("could not look up order for review {}: {}", review.id, e);
            None
        });

    app_state
        .notification_service
        .dispatch(vec![review_notification(&review, &service, related_order)])
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": review })),
    ))
}

pub async fn get_favorites(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let services = app_state
        .db_client
        .get_favorite_services(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": services })))
}

pub async fn add_favorite(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let service = load_service(&app_state, service_id).await?;

    let favorite = app_state
        .db_client
        .add_favorite(user.user.id, service.id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::conflict("Service is already in your favorites")
            } else {
                HttpError::server_error(e.to_string())
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": favorite })),
    ))
}

pub async fn remove_favorite(
    Path(service_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let removed = app_state
        .db_client
        .remove_favorite(user.user.id, service_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if removed == 0 {
        return Err(HttpError::not_found("Service is not in your favorites"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_active_promotions(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let promotions = app_state
        .db_client
        .get_active_promotions(Utc::now())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({ "status": "success", "data": promotions })))
}

pub async fn quote_promotion(
    Path(service_id): Path<Uuid>,
    Query(query): Query<PromotionQuoteQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;
    let service = load_service(&app_state, service_id).await?;

    let promotion = app_state
        .db_client
        .get_promotion_by_code(query.code.trim())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Promotion not found"))?;

    let now = Utc::now();
    if !promotion.is_valid(now) {
        return Err(HttpError::bad_request("This promotion is no longer valid"));
    }
    if !promotion.applies_to(&service) {
        return Err(HttpError::bad_request("This promotion does not apply to this service"));
    }

    let discounted_price = promotion.apply_discount(&service.price, now);

    Ok(Json(json!({
        "status": "success",
        "data": PromotionQuoteDto {
            original_price: service.price.clone(),
            discounted_price,
            promotion,
        }
    })))
}
