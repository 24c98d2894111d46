use uuid::Uuid;

use crate::models::usermodel::User;

/// Who is driving a domain operation.
#[derive(Debug, Clone, Copy)]
pub enum Actor<'a> {
    User(&'a User),
    /// Gateway callbacks and scheduled jobs; skips ownership checks.
    System,
}

impl<'a> Actor<'a> {
    pub fn user(&self) -> Option<&'a User> {
        match self {
            Actor::User(user) => Some(user),
            Actor::System => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|user| user.id)
    }
}
