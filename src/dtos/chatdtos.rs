use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::chatmodel::{Conversation, MessageType};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationDto {
    #[validate(length(min = 1, message = "At least one other participant is required"))]
    pub participant_ids: Vec<Uuid>,
    #[validate(length(max = 200, message = "Subject is too long"))]
    pub subject: Option<String>,
    pub related_order_id: Option<Uuid>,
    pub related_service_id: Option<Uuid>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageDto {
    #[validate(length(min = 1, max = 5000, message = "Message cannot be empty"))]
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[validate(url(message = "Attachment must be a URL"))]
    pub attachment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationDetailDto {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participant_ids: Vec<Uuid>,
}
