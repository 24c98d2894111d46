// db/userdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{AccountType, User};

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error>;

    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;

    #[allow(clippy::too_many_arguments)]
    async fn save_user<T: Into<String> + Send>(
        &self,
        username: T,
        email: T,
        password: T,
        first_name: T,
        last_name: T,
        account_type: AccountType,
        phone_number: Option<String>,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        first_name: Option<String>,
        last_name: Option<String>,
        phone_number: Option<String>,
        bio: Option<String>,
        profile_picture: Option<String>,
    ) -> Result<User, sqlx::Error>;

    async fn update_account_type(
        &self,
        user_id: Uuid,
        account_type: AccountType,
    ) -> Result<User, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, username, email, password, first_name, last_name,
                       account_type, phone_number, bio, profile_picture,
                       created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, username, email, password, first_name, last_name,
                       account_type, phone_number, bio, profile_picture,
                       created_at, updated_at
                FROM users
                WHERE username = $1
                "#,
            )
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT id, username, email, password, first_name, last_name,
                       account_type, phone_number, bio, profile_picture,
                       created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, first_name, last_name,
                   account_type, phone_number, bio, profile_picture,
                   created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, first_name, last_name,
                   account_type, phone_number, bio, profile_picture,
                   created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn save_user<T: Into<String> + Send>(
        &self,
        username: T,
        email: T,
        password: T,
        first_name: T,
        last_name: T,
        account_type: AccountType,
        phone_number: Option<String>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, first_name, last_name,
                               account_type, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, password, first_name, last_name,
                      account_type, phone_number, bio, profile_picture,
                      created_at, updated_at
            "#,
        )
        .bind(username.into())
        .bind(email.into())
        .bind(password.into())
        .bind(first_name.into())
        .bind(last_name.into())
        .bind(account_type)
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        first_name: Option<String>,
        last_name: Option<String>,
        phone_number: Option<String>,
        bio: Option<String>,
        profile_picture: Option<String>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                bio = COALESCE($5, bio),
                profile_picture = COALESCE($6, profile_picture),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password, first_name, last_name,
                      account_type, phone_number, bio, profile_picture,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone_number)
        .bind(bio)
        .bind(profile_picture)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_account_type(
        &self,
        user_id: Uuid,
        account_type: AccountType,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET account_type = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password, first_name, last_name,
                      account_type, phone_number, bio, profile_picture,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(account_type)
        .fetch_one(&self.pool)
        .await
    }
}
