use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CreateUserError, NewUser, TokenRecord, User, UserStore};

/// Lock-guarded store for tests and local runs without a database.
///
/// The duplicate check and the insert run under a single write lock, so it
/// upholds the same uniqueness guarantee the Postgres constraints provide.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    tokens: Vec<TokenRecord>,
}

impl InMemoryUserStore {
    /// Token records written for an account, oldest first.
    pub async fn tokens_for(&self, user_id: Uuid) -> Vec<TokenRecord> {
        let inner = self.inner.read().await;
        inner
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_nickname(&self, nickname: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.nickname == nickname).cloned())
    }

    async fn find_by_login(&self, login: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email == login || u.nickname == login)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, CreateUserError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == new_user.email) {
            return Err(CreateUserError::EmailTaken);
        }
        if inner.users.iter().any(|u| u.nickname == new_user.nickname) {
            return Err(CreateUserError::NicknameTaken);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            nickname: new_user.nickname,
            password_hash: new_user.password_hash,
            name: None,
            display_name: None,
            phone: None,
            language: None,
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn insert_token(&self, token: &str, user_id: Uuid) -> anyhow::Result<TokenRecord> {
        let mut inner = self.inner.write().await;
        let record = TokenRecord {
            id: Uuid::new_v4(),
            token: token.to_string(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.tokens.push(record.clone());
        Ok(record)
    }
}
