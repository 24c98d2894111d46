use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{chatdb::ChatExt, userdb::UserExt},
    dtos::{
        chatdtos::{ConversationDetailDto, CreateConversationDto, SendMessageDto},
        RequestQueryDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::chatmodel::Conversation,
    service::notification_service::message_notifications,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/", get(get_conversations).post(create_conversation))
        .route("/:conversation_id", get(get_conversation))
        .route(
            "/:conversation_id/messages",
            get(get_messages).post(send_message),
        )
}

/// Loads a conversation the caller takes part in, with its participant ids.
async fn load_conversation(
    app_state: &AppState,
    conversation_id: Uuid,
    user: &JWTAuthMiddeware,
) -> Result<(Conversation, Vec<Uuid>), HttpError> {
    let conversation = app_state
        .db_client
        .get_conversation(conversation_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Conversation not found"))?;

    let participant_ids = app_state
        .db_client
        .get_participant_ids(conversation.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !participant_ids.contains(&user.user.id) {
        return Err(HttpError::forbidden("You are not part of this conversation"));
    }

    Ok((conversation, participant_ids))
}

/// The creator plus the requested participants, without duplicates.
pub fn conversation_members(creator: Uuid, others: &[Uuid]) -> Vec<Uuid> {
    let mut members = vec![creator];
    for id in others {
        if !members.contains(id) {
            members.push(*id);
        }
    }
    members
}

pub async fn get_conversations(
    Query(query): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;

    let conversations = app_state
        .db_client
        .get_user_conversations(user.user.id, query.limit() as i64, query.offset())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "results": conversations.len(),
        "data": conversations
    })))
}

pub async fn create_conversation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateConversationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let members = conversation_members(user.user.id, &body.participant_ids);
    if members.len() < 2 {
        return Err(HttpError::bad_request(
            "A conversation needs at least one other participant",
        ));
    }

    let known = app_state
        .db_client
        .get_users_by_ids(&members)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    if known.len() != members.len() {
        return Err(HttpError::bad_request("One or more participants do not exist"));
    }

    let conversation = app_state
        .db_client
        .create_conversation(
            body.subject.unwrap_or_default(),
            body.related_order_id,
            body.related_service_id,
            &members,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": ConversationDetailDto {
                conversation,
                participant_ids: members,
            }
        })),
    ))
}

pub async fn get_conversation(
    Path(conversation_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let (conversation, participant_ids) =
        load_conversation(&app_state, conversation_id, &user).await?;

    Ok(Json(json!({
        "status": "success",
        "data": ConversationDetailDto {
            conversation,
            participant_ids,
        }
    })))
}

pub async fn get_messages(
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;
    let (conversation, _) = load_conversation(&app_state, conversation_id, &user).await?;

    let messages = app_state
        .db_client
        .get_messages(conversation.id, query.limit() as i64, query.offset())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // Reading the thread marks the other side's messages as read.
    if let Err(e) = app_state
        .db_client
        .mark_messages_as_read(conversation.id, user.user.id)
        .await
    {
        tracing::warn!("failed to mark messages read in {}: {}", conversation.id, e);
    }

    Ok(Json(json!({
        "status": "success",
        "results": messages.len(),
        "data": messages
    })))
}

pub async fn send_message(
    Path(conversation_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;
    let (conversation, participant_ids) =
        load_conversation(&app_state, conversation_id, &user).await?;

    let message = app_state
        .db_client
        .send_message(
            conversation.id,
            user.user.id,
            body.content,
            body.message_type,
            body.attachment,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .notification_service
        .dispatch(message_notifications(
            &conversation,
            &message,
            &user.user,
            &participant_ids,
        ))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": message })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_is_included_once() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let members = conversation_members(me, &[other, me, other]);
        assert_eq!(members, vec![me, other]);
    }

    #[test]
    fn talking_to_yourself_leaves_one_member() {
        let me = Uuid::new_v4();
        assert_eq!(conversation_members(me, &[me]).len(), 1);
    }
}
