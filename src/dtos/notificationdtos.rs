use serde::{Deserialize, Serialize};
use validator::Validate;

use super::page_offset;

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

impl NotificationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20) as i64
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.limit())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountDto {
    pub unread_count: i64,
}
