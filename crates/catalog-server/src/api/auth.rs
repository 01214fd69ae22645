//! Registration, login, and the caller's token profile.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Extension, Json};
use catalog_core::{normalize_text, validate_addresses, Address, AddressesInput, Role};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::middleware::{AuthUser, RequestId};

use super::{json_body, map_db_error, map_unique_violation, ApiError, ApiResponse, AppState};

const DUPLICATE_EMAIL: &str = "User with this email already exists";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub address: Option<AddressesInput>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserBody {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<Address>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub(super) struct ProfileResponse {
    pub message: &'static str,
    pub user: ProfileUser,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;

    let text = |v: &Option<String>| normalize_text(v.as_deref());
    let (Some(first_name), Some(last_name), Some(email), Some(phone)) = (
        text(&body.first_name),
        text(&body.last_name),
        text(&body.email),
        text(&body.phone),
    ) else {
        return Err(ApiError::new(rid, "bad_request", "All fields are required"));
    };
    let password = match body.password.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => return Err(ApiError::new(rid, "bad_request", "All fields are required")),
    };
    if body.address.is_none() {
        return Err(ApiError::new(rid, "bad_request", "All fields are required"));
    }

    let addresses = validate_addresses(body.address.as_ref())
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;
    let role = match normalize_text(body.role.as_deref()) {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?,
        None => Role::default(),
    };

    let existing = catalog_db::get_user_by_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if existing.is_some() {
        return Err(ApiError::new(rid, "conflict", DUPLICATE_EMAIL));
    }

    let password_hash = hash_password(password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::new(rid, "internal_error", "Internal server error")
    })?;

    let user = catalog_db::create_user(
        &state.pool,
        &catalog_db::NewUser {
            first_name: &first_name,
            last_name: &last_name,
            email: &email,
            password_hash: &password_hash,
            role,
            phone: &phone,
            addresses: &addresses,
        },
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, DUPLICATE_EMAIL))?;

    let token = issue_token(&state, rid, &user, role)?;
    tracing::info!(user_id = %user.public_id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            req_id.0.clone(),
            SessionResponse {
                message: "User registered successfully",
                token,
                user: UserBody {
                    id: user.public_id.to_string(),
                    first_name: user.first_name,
                    last_name: user.last_name,
                    email: user.email,
                    role,
                    phone: user.phone,
                    address: Some(user.addresses.0),
                    cart: Some(Vec::new()),
                },
            },
        )),
    ))
}

/// POST /api/v1/auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;

    let (Some(email), Some(password)) = (
        normalize_text(body.email.as_deref()),
        body.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::new(
            rid,
            "bad_request",
            "Email and password are required",
        ));
    };

    let user = catalog_db::get_user_by_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "unauthorized", INVALID_CREDENTIALS))?;

    if !verify_password(password, &user.password_hash) {
        return Err(ApiError::new(rid, "unauthorized", INVALID_CREDENTIALS));
    }

    let role = user.role().map_err(|e| map_db_error(rid.clone(), &e))?;
    let token = issue_token(&state, rid, &user, role)?;

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        SessionResponse {
            message: "Login successful",
            token,
            user: UserBody {
                id: user.public_id.to_string(),
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                role,
                phone: user.phone,
                address: None,
                cart: None,
            },
        },
    )))
}

/// GET /api/v1/users/profile
pub(super) async fn profile(
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Json<ApiResponse<ProfileResponse>> {
    Json(ApiResponse::new(
        req_id.0,
        ProfileResponse {
            message: "This is a protected route",
            user: ProfileUser {
                user_id: user.user_id,
                email: user.email,
                role: user.role,
            },
        },
    ))
}

fn issue_token(
    state: &AppState,
    rid: &str,
    user: &catalog_db::UserRow,
    role: Role,
) -> Result<String, ApiError> {
    state
        .tokens
        .issue(user.public_id, &user.email, role)
        .map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            ApiError::new(rid, "internal_error", "Internal server error")
        })
}
