use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CreateUserError, NewUser, TokenRecord, User, UserStore};

/// Postgres-backed store. Ids and timestamps come from column defaults, and
/// the unique indexes on `email`/`nickname` are the real uniqueness
/// guarantee behind the handlers' pre-checks.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, nickname, password_hash, name, display_name, phone, language,
                   created_at, last_login
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_nickname(&self, nickname: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, nickname, password_hash, name, display_name, phone, language,
                   created_at, last_login
            FROM users
            WHERE nickname = $1
            "#,
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, nickname, password_hash, name, display_name, phone, language,
                   created_at, last_login
            FROM users
            WHERE email = $1 OR nickname = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, nickname, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, nickname, password_hash, name, display_name, phone, language,
                      created_at, last_login
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.nickname)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify_create_error)?;
        Ok(user)
    }

    async fn insert_token(&self, token: &str, user_id: Uuid) -> anyhow::Result<TokenRecord> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            INSERT INTO tokens (token, user_id)
            VALUES ($1, $2)
            RETURNING id, token, user_id, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }
}

/// Maps a unique-constraint violation on insert to the matching typed error;
/// anything else stays opaque.
fn classify_create_error(err: sqlx::Error) -> CreateUserError {
    let constraint = err
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| db.constraint())
        .map(str::to_owned);
    match constraint.as_deref() {
        Some("users_email_key") => CreateUserError::EmailTaken,
        Some("users_nickname_key") => CreateUserError::NicknameTaken,
        _ => CreateUserError::Other(err.into()),
    }
}
