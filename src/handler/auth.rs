use std::sync::Arc;

use axum::{
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::{db::is_unique_violation, userdb::UserExt},
    dtos::{
        userdtos::{
            FilterUserDto, LoginUserDto, RegisterUserDto, UserData, UserLoginResponseDto,
            UserResponseDto,
        },
        Response,
    },
    error::{ErrorMessage, HttpError},
    models::usermodel::AccountType,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let existing = app_state
        .db_client
        .get_user(None, None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    if existing.is_some() {
        return Err(HttpError::conflict(ErrorMessage::EmailExist.to_string()));
    }

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = app_state
        .db_client
        .save_user(
            body.username,
            body.email,
            hashed_password,
            body.first_name,
            body.last_name,
            body.account_type.unwrap_or(AccountType::Client),
            body.phone_number,
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::conflict(ErrorMessage::UsernameExist.to_string())
            } else {
                HttpError::server_error(e.to_string())
            }
        })?;

    tracing::info!("registered user {} ({})", user.username, user.account_type.to_str());

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let user = app_state
        .db_client
        .get_user(None, None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, Some(&user.password))
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;
    if !password_matched {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage * 60,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(app_state.env.jwt_maxage))
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Failed to build session cookie"))?,
    );

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        user: FilterUserDto::filter_user(&user),
    })
    .into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    let cookie = Cookie::build(("token", ""))
        .path("/")
        .max_age(time::Duration::minutes(-1))
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Failed to clear session cookie"))?,
    );

    let mut response = Json(Response {
        status: "success",
        message: "Logged out".to_string(),
    })
    .into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}
