use serde::{Deserialize, Serialize};

use crate::store::User;

/// Request body for sign-up. Fields default to empty so an absent field and
/// an empty one fail validation the same way.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub nickname: String,
}

/// Request body for sign-in. `login` may be an email or a nickname.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// Response returned after a successful sign-up or sign-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
