use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::orderdtos::{
        CreateOrderDto, OrderQuery, OrderResponseDto, UpdateOrderDto, UpdateOrderStatusDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::actor::Actor,
    AppState,
};

pub fn orders_handler() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/:order_id",
            get(get_order).patch(update_order).delete(delete_order),
        )
        .route("/:order_id/status", put(update_order_status))
}

pub async fn create_order(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateOrderDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let order = app_state.order_service.book_order(&user.user, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": OrderResponseDto::new(order, Utc::now())
        })),
    ))
}

pub async fn list_orders(
    Query(query): Query<OrderQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;

    let orders = app_state.order_service.list_orders(&user.user, &query).await?;

    Ok(Json(json!({
        "status": "success",
        "results": orders.len(),
        "data": OrderResponseDto::many(orders)
    })))
}

pub async fn get_order(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let order = app_state.order_service.get_order_for(&user.user, order_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": OrderResponseDto::new(order, Utc::now())
    })))
}

pub async fn update_order(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateOrderDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let order = app_state
        .order_service
        .update_details(&user.user, order_id, body)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": OrderResponseDto::new(order, Utc::now())
    })))
}

pub async fn update_order_status(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateOrderStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let order = app_state
        .order_service
        .update_status(Actor::User(&user.user), order_id, &body.status)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": OrderResponseDto::new(order, Utc::now())
    })))
}

pub async fn delete_order(
    Path(order_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.order_service.delete_order(&user.user, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
