use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const SELECT_USER: &str = r#"
SELECT user_id, email, password_hash, is_chirpy_red, created_at, updated_at
FROM user
"#;

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_credentials(row: MySqlRow) -> Result<UserCredentials, AuthError> {
        let password_hash: String = row.try_get("password_hash").map_err(store_err)?;
        Ok(UserCredentials {
            identity: Self::row_to_identity(&row)?,
            password_hash,
        })
    }

    fn row_to_identity(row: &MySqlRow) -> Result<UserIdentity, AuthError> {
        Ok(UserIdentity {
            id: row.try_get("user_id").map_err(store_err)?,
            email: row.try_get("email").map_err(store_err)?,
            is_chirpy_red: row.try_get("is_chirpy_red").map_err(store_err)?,
            created_at: row.try_get("created_at").map_err(store_err)?,
            updated_at: row.try_get("updated_at").map_err(store_err)?,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(&self, record: NewUserRecord) -> Result<UserIdentity, AuthError> {
        sqlx::query(
            r#"
INSERT INTO user (user_id, email, password_hash, is_chirpy_red, created_at, updated_at)
VALUES (?, ?, ?, FALSE, ?, ?)
"#,
        )
        .bind(record.user_id)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                store_err(e)
            }
        })?;

        Ok(UserIdentity {
            id: record.user_id,
            created_at: record.created_at,
            updated_at: record.created_at,
            email: record.email,
            is_chirpy_red: false,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(&format!("{SELECT_USER} WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row_opt.map(Self::row_to_credentials).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserIdentity>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(&format!("{SELECT_USER} WHERE user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row_opt.as_ref().map(Self::row_to_identity).transpose()
    }

    async fn update_credential(
        &self,
        user_id: UserId,
        password_hash: &str,
        email: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserIdentity>, AuthError> {
        sqlx::query(
            r#"
UPDATE user
SET email = ?, password_hash = ?, updated_at = ?
WHERE user_id = ?
"#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(updated_at)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                store_err(e)
            }
        })?;

        self.find_by_id(user_id).await
    }

    async fn set_privilege_flag(
        &self,
        user_id: UserId,
        is_chirpy_red: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserIdentity>, AuthError> {
        sqlx::query("UPDATE user SET is_chirpy_red = ?, updated_at = ? WHERE user_id = ?")
            .bind(is_chirpy_red)
            .bind(updated_at)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        self.find_by_id(user_id).await
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        // refresh_token rows go with their user (ON DELETE CASCADE)
        let done = sqlx::query("DELETE FROM user")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(done.rows_affected())
    }
}
