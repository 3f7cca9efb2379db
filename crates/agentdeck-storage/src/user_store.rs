// UserStore on Postgres

use agentdeck_core::{NewUser, StoreResult, User, UserCredentials, UserStore};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::UserRow;
use crate::repositories::{map_db_error, Database};

const USER_COLUMNS: &str = "id, email, name, avatar, role, password_hash, created_at";

#[async_trait]
impl UserStore for Database {
    async fn create_user(&self, input: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name, avatar, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(input.email.trim().to_lowercase())
        .bind(&input.name)
        .bind(&input.avatar)
        .bind(input.role.as_str())
        .bind(&input.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to create user", e))?;

        Ok(UserCredentials::try_from(row)?.user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to get user", e))?;

        row.map(|r| UserCredentials::try_from(r).map(|c| c.user))
            .transpose()
    }

    async fn get_user_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_db_error("Failed to get user by email", e))?;

        row.map(UserCredentials::try_from).transpose()
    }
}
