use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, Result},
    services::account::{self, UserCreationRequest},
    services::identity,
    state::AppState,
};

/// The request payload for signup.
///
/// Fields are optional so their absence surfaces as this API's own
/// validation errors rather than a framework rejection.
#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    pub role: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "universityID")]
    pub university_id: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "availableSlots")]
    pub available_slots: Option<Vec<Value>>,
}

/// The public view of a freshly created user.
#[derive(Serialize)]
pub struct SignupUser {
    pub name: String,
    #[serde(rename = "universityID")]
    pub university_id: String,
}

#[derive(Serialize)]
pub struct SignupData {
    pub token: String,
    pub user: SignupUser,
}

/// The response payload for signup.
#[derive(Serialize)]
pub struct SignupResponse {
    pub data: SignupData,
}

/// The request payload for login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(rename = "universityID")]
    pub university_id: Option<String>,
    pub password: Option<String>,
}

/// The response payload for login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Handles signup. A new account is logged in immediately: the response
/// carries a freshly signed session token.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!(
        "Signup attempt - role: {:?}, universityID: {:?}",
        payload.role,
        payload.university_id
    );

    let request = UserCreationRequest::new(
        payload.role,
        payload.name,
        payload.university_id,
        payload.password,
        payload.available_slots,
    )?;

    let created = account::create_account(state.store.as_ref(), &state.tokens, request).await?;

    tracing::info!("User registered: {}", created.university_id);

    let response = SignupResponse {
        data: SignupData {
            token: created.token,
            user: SignupUser {
                name: created.name,
                university_id: created.university_id,
            },
        },
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    let (university_id, password) = match (payload.university_id, payload.password) {
        (Some(id), Some(password)) if !id.is_empty() && !password.is_empty() => (id, password),
        _ => {
            return Err(AppError::Validation(
                "Please enter valid ID and password".to_string(),
            ));
        }
    };

    tracing::info!("Login attempt: {}", university_id);

    let user = identity::resolve_by_credentials(state.store.as_ref(), &university_id, &password)
        .await?;
    let token = state.tokens.sign(user.id())?;

    tracing::info!("User logged in: {}", user.id());

    let response = LoginResponse { token };
    Ok((StatusCode::OK, Json(response)).into_response())
}
