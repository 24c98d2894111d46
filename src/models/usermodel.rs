// models/usermodel.rs
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "account_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Client,
    Provider,
    Business,
}

impl AccountType {
    pub fn to_str(&self) -> &str {
        match self {
            AccountType::Client => "client",
            AccountType::Provider => "provider",
            AccountType::Business => "business",
        }
    }

    /// Providers and businesses both offer services.
    pub fn is_provider(&self) -> bool {
        matches!(self, AccountType::Provider | AccountType::Business)
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub account_type: AccountType,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    pub fn is_provider(&self) -> bool {
        self.account_type.is_provider()
    }

    pub fn is_client(&self) -> bool {
        self.account_type == AccountType::Client
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user(username: &str, first: &str, last: &str, account_type: AccountType) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@test.com", username),
            password: String::new(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            account_type,
            phone_number: None,
            bio: None,
            profile_picture: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::user;
    use super::*;

    #[test]
    fn full_name_falls_back_to_username() {
        let named = user("jdoe", "Jane", "Doe", AccountType::Provider);
        assert_eq!(named.full_name(), "Jane Doe");

        let anonymous = user("anon", "", "", AccountType::Client);
        assert_eq!(anonymous.full_name(), "anon");
    }

    #[test]
    fn business_accounts_are_providers() {
        assert!(AccountType::Business.is_provider());
        assert!(AccountType::Provider.is_provider());
        assert!(!AccountType::Client.is_provider());
    }
}
