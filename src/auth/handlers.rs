use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, SignInRequest, SignUpRequest},
        jwt::{JwtKeys, UserClaims},
        password::{hash_password, verify_password},
        validate::require_fields,
    },
    error::ApiError,
    state::AppState,
    store::{CreateUserError, NewUser},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if let Err(e) = require_fields(&[
        ("Email", &payload.email),
        ("Password", &payload.password),
        ("Nickname", &payload.nickname),
    ]) {
        warn!(error = %e, "sign-up with missing field");
        return Err(e);
    }

    // Friendly early conflicts; the unique constraints are the real guarantee.
    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already in use");
        return Err(ApiError::Conflict("Email already in use"));
    }
    if state
        .users
        .find_by_nickname(&payload.nickname)
        .await?
        .is_some()
    {
        warn!(nickname = %payload.nickname, "nickname already in use");
        return Err(ApiError::Conflict("Nickname already in use"));
    }

    let password_hash = hash_password(&payload.password)?;

    // A concurrent sign-up can still win the race past the checks above; the
    // store reports the constraint violation and it becomes the same 409.
    let user = match state
        .users
        .create(NewUser {
            email: payload.email,
            nickname: payload.nickname,
            password_hash,
        })
        .await
    {
        Ok(user) => user,
        Err(e @ (CreateUserError::EmailTaken | CreateUserError::NicknameTaken)) => {
            warn!(error = %e, "create conflict after pre-checks");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(
        UserClaims {
            id: Some(user.id),
            nickname: user.nickname.clone(),
            email: user.email.clone(),
        },
        user.id,
    )?;

    if let Err(e) = state.users.insert_token(&token, user.id).await {
        // Audit record only; the issued token works without it.
        warn!(error = %e, user_id = %user.id, "token record insert failed");
    }

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if let Err(e) =
        require_fields(&[("Login", &payload.login), ("Password", &payload.password)])
    {
        warn!(error = %e, "sign-in with missing field");
        return Err(e);
    }

    // One response for unknown login and for wrong password.
    let user = match state.users.find_by_login(&payload.login).await? {
        Some(u) => u,
        None => {
            warn!(login = %payload.login, "sign-in with unknown login");
            return Err(ApiError::WrongCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "sign-in with wrong password");
        return Err(ApiError::WrongCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(
        UserClaims {
            id: None, // historical payload shape; sub still carries the id
            nickname: user.nickname.clone(),
            email: user.email.clone(),
        },
        user.id,
    )?;

    if let Err(e) = state.users.insert_token(&token, user.id).await {
        warn!(error = %e, user_id = %user.id, "token record insert failed");
    }

    info!(user_id = %user.id, "user signed in");
    Ok(Json(AuthResponse { token, user }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::InMemoryUserStore;

    fn sign_up_request(email: &str, password: &str, nickname: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.into(),
            password: password.into(),
            nickname: nickname.into(),
        }
    }

    fn sign_in_request(login: &str, password: &str) -> SignInRequest {
        SignInRequest {
            login: login.into(),
            password: password.into(),
        }
    }

    async fn seeded_state() -> AppState {
        let state = AppState::in_memory();
        sign_up(
            State(state.clone()),
            Json(sign_up_request("a@x.com", "123456", "nick")),
        )
        .await
        .expect("seed sign-up should succeed");
        state
    }

    #[tokio::test]
    async fn sign_up_creates_user_and_returns_token() {
        let state = AppState::in_memory();

        let (status, Json(body)) = sign_up(
            State(state),
            Json(sign_up_request("a@x.com", "123456", "nick")),
        )
        .await
        .expect("sign-up should succeed");

        assert_eq!(status, StatusCode::CREATED);
        assert!(!body.token.is_empty());
        assert!(!body.user.id.is_nil());
        assert_eq!(body.user.email, "a@x.com");
        assert_eq!(body.user.nickname, "nick");
        assert_ne!(body.user.password_hash, "123456");
        assert!(verify_password("123456", &body.user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn sign_up_rejects_email_already_in_use() {
        let state = seeded_state().await;

        let err = sign_up(
            State(state),
            Json(sign_up_request("a@x.com", "123456", "other-nick")),
        )
        .await
        .expect_err("duplicate email should fail");

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Email already in use");
    }

    #[tokio::test]
    async fn sign_up_rejects_nickname_already_in_use() {
        let state = seeded_state().await;

        let err = sign_up(
            State(state),
            Json(sign_up_request("b@x.com", "123456", "nick")),
        )
        .await
        .expect_err("duplicate nickname should fail");

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Nickname already in use");
    }

    #[tokio::test]
    async fn sign_up_requires_email_first() {
        let state = AppState::in_memory();

        let err = sign_up(State(state), Json(sign_up_request("", "", "")))
            .await
            .expect_err("missing email should fail");

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Email not found on request body");
    }

    #[tokio::test]
    async fn sign_up_requires_password_then_nickname() {
        let state = AppState::in_memory();

        let err = sign_up(
            State(state.clone()),
            Json(sign_up_request("a@x.com", "", "nick")),
        )
        .await
        .expect_err("missing password should fail");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Password not found on request body");

        let err = sign_up(
            State(state),
            Json(sign_up_request("a@x.com", "123456", "")),
        )
        .await
        .expect_err("missing nickname should fail");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Nickname not found on request body");
    }

    #[tokio::test]
    async fn sign_in_works_with_email_or_nickname() {
        let state = seeded_state().await;

        let Json(by_email) = sign_in(
            State(state.clone()),
            Json(sign_in_request("a@x.com", "123456")),
        )
        .await
        .expect("sign-in by email should succeed");
        assert!(!by_email.token.is_empty());
        assert_eq!(by_email.user.email, "a@x.com");

        let Json(by_nickname) = sign_in(State(state), Json(sign_in_request("nick", "123456")))
            .await
            .expect("sign-in by nickname should succeed");
        assert_eq!(by_nickname.user.nickname, "nick");
    }

    #[tokio::test]
    async fn sign_in_requires_login_then_password() {
        let state = AppState::in_memory();

        let err = sign_in(State(state.clone()), Json(sign_in_request("", "123456")))
            .await
            .expect_err("missing login should fail");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Login not found on request body");

        let err = sign_in(State(state), Json(sign_in_request("a@x.com", "")))
            .await
            .expect_err("missing password should fail");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "Password not found on request body");
    }

    #[tokio::test]
    async fn sign_in_failures_are_indistinguishable() {
        let state = seeded_state().await;

        let unknown = sign_in(
            State(state.clone()),
            Json(sign_in_request("ghost@x.com", "123456")),
        )
        .await
        .expect_err("unknown login should fail");

        let wrong = sign_in(State(state), Json(sign_in_request("a@x.com", "wrong")))
            .await
            .expect_err("wrong password should fail");

        assert_eq!(unknown.status(), StatusCode::FORBIDDEN);
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
        assert_eq!(unknown.to_string(), "Wrong credentials");
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn both_flows_write_a_token_record() {
        let store = Arc::new(InMemoryUserStore::default());
        let state = AppState::from_parts(store.clone(), AppState::in_memory().config);

        let (_, Json(created)) = sign_up(
            State(state.clone()),
            Json(sign_up_request("a@x.com", "123456", "nick")),
        )
        .await
        .expect("sign-up should succeed");
        assert_eq!(store.tokens_for(created.user.id).await.len(), 1);

        sign_in(State(state), Json(sign_in_request("a@x.com", "123456")))
            .await
            .expect("sign-in should succeed");
        let records = store.tokens_for(created.user.id).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.user_id == created.user.id));
    }

    // Pins the current wire contract: the user object is serialized whole,
    // password_hash included. Changing this is a deliberate breaking change.
    #[tokio::test]
    async fn response_user_still_carries_password_hash() {
        let state = AppState::in_memory();

        let (_, Json(body)) = sign_up(
            State(state),
            Json(sign_up_request("a@x.com", "123456", "nick")),
        )
        .await
        .expect("sign-up should succeed");

        let serialized = serde_json::to_value(&body).unwrap();
        assert!(serialized["user"]["password_hash"].is_string());
    }
}
