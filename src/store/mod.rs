use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Account record as stored.
///
/// The wire shape still carries `password_hash`. Clients consume the record
/// verbatim, so excluding the hash is a breaking contract change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,    // unique
    pub nickname: String, // unique
    pub password_hash: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub language: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

/// Input for account creation. Profile fields start out empty; the store
/// assigns id and creation timestamp.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
}

/// Audit record linking an issued token to an account. Written once, never
/// read by the request flow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenRecord {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Why an account could not be created.
///
/// The uniqueness variants exist so a constraint violation raced past the
/// handler's pre-checks still maps to the documented conflict response.
#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("email already in use")]
    EmailTaken,
    #[error("nickname already in use")]
    NicknameTaken,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Durable storage for accounts and token records.
///
/// Injected into `AppState` as a trait object so handlers run against
/// Postgres in production and the in-memory store in tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_nickname(&self, nickname: &str) -> anyhow::Result<Option<User>>;

    /// Looks up the account whose email *or* nickname equals `login`.
    async fn find_by_login(&self, login: &str) -> anyhow::Result<Option<User>>;

    async fn create(&self, new_user: NewUser) -> Result<User, CreateUserError>;

    async fn insert_token(&self, token: &str, user_id: Uuid) -> anyhow::Result<TokenRecord>;
}
