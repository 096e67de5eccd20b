//! Account management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extractors::{RequestOrigin, UserForm},
    middleware::AuthUser,
};
use agrichain_core::identity::{AccountProfile, AccountSummary, RoleDetail, RoleKind};
use agrichain_core::storage::FileCleanupWarning;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register_user))
        .route(
            "/users/{uuid}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

// ============================================================================
// Response Types
// ============================================================================

/// Response for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Human-readable outcome.
    pub msg: &'static str,
    /// Identifier of the new account.
    pub uuid: Uuid,
}

/// Response for a successful update or delete.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    /// Human-readable outcome.
    pub msg: &'static str,
    /// Photo files that could not be cleaned up.
    pub warnings: Vec<String>,
}

/// An account with its role detail.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Account identifier.
    pub uuid: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role tag.
    pub role: RoleKind,
    /// Role detail, or `{}` when the store has no row.
    #[serde(rename = "additionalInfo")]
    pub additional_info: AdditionalInfo,
}

/// Role detail payload of [`UserResponse`].
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AdditionalInfo {
    /// The detail record.
    Detail(RoleDetail),
    /// No detail record; serialized as `{}`.
    Empty {},
}

impl From<AccountProfile> for UserResponse {
    fn from(profile: AccountProfile) -> Self {
        let AccountProfile { account, detail } = profile;
        Self {
            uuid: account.uuid,
            name: account.name,
            email: account.email,
            role: account.role,
            additional_info: detail.map_or(AdditionalInfo::Empty {}, AdditionalInfo::Detail),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse an account identifier; anything that is not a UUID matches nothing.
pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("account not found: {raw}")))
}

fn warning_messages(warnings: &[FileCleanupWarning]) -> Vec<String> {
    warnings
        .iter()
        .inspect(|w| warn!(filename = %w.filename, reason = %w.reason, "Returning cleanup warning"))
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/users`
/// List every account.
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    let accounts = state.identity_service().list().await?;
    Ok(Json(accounts))
}

/// GET `/users/{uuid}`
/// Get one account with its role detail.
async fn get_user(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_uuid(&uuid)?;
    let profile = state.identity_service().get(id).await?;
    Ok(Json(profile.into()))
}

/// POST `/users`
/// Register an account.
async fn register_user(
    State(state): State<AppState>,
    auth: AuthUser,
    origin: RequestOrigin,
    form: UserForm,
) -> Result<impl IntoResponse, ApiError> {
    debug!(
        actor = %auth.account_id(),
        actor_role = auth.role(),
        "Registering account"
    );

    let account = state
        .identity_service()
        .register(form.into_register_input(), origin.as_str())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            msg: "Register successful",
            uuid: account.id,
        }),
    ))
}

/// PUT `/users/{uuid}`
/// Update an account.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uuid): Path<String>,
    origin: RequestOrigin,
    form: UserForm,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = parse_uuid(&uuid)?;
    debug!(
        actor = %auth.account_id(),
        actor_role = auth.role(),
        uuid = %id,
        "Updating account"
    );

    let outcome = state
        .identity_service()
        .update(id, form.into_update_input(), origin.as_str())
        .await?;

    Ok(Json(MutationResponse {
        msg: "User updated",
        warnings: warning_messages(&outcome.warnings),
    }))
}

/// DELETE `/users/{uuid}`
/// Delete an account.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uuid): Path<String>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = parse_uuid(&uuid)?;
    debug!(
        actor = %auth.account_id(),
        actor_role = auth.role(),
        uuid = %id,
        "Deleting account"
    );

    let outcome = state.identity_service().delete(id).await?;

    Ok(Json(MutationResponse {
        msg: "User deleted",
        warnings: warning_messages(&outcome.warnings),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bearer, send, test_state, test_state_with};
    use agrichain_db::entities::users;
    use axum::{
        body::Body,
        http::{Method, Request, header::CONTENT_TYPE},
    };
    use rstest::rstest;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_additional_info_serialization() {
        let profile = AccountProfile {
            account: AccountSummary {
                uuid: Uuid::nil(),
                name: "Budi".to_string(),
                email: "budi@x.com".to_string(),
                role: RoleKind::Farmer,
            },
            detail: None,
        };

        let json = serde_json::to_value(UserResponse::from(profile)).unwrap();
        assert_eq!(json["role"], "petani");
        assert_eq!(json["additionalInfo"], serde_json::json!({}));
    }

    #[test]
    fn test_detail_hides_password_hash() {
        let detail = RoleDetail {
            uuid: Uuid::nil(),
            name: "Budi".to_string(),
            email: "budi@x.com".to_string(),
            nohp: String::new(),
            alamat: String::new(),
            foto: "defaultProfile.png".to_string(),
            url: "http://localhost:5000/profile/defaultProfile.png".to_string(),
            password_hash: "$argon2id$secret".to_string(),
        };
        let profile = AccountProfile {
            account: AccountSummary {
                uuid: Uuid::nil(),
                name: "Budi".to_string(),
                email: "budi@x.com".to_string(),
                role: RoleKind::Farmer,
            },
            detail: Some(detail),
        };

        let json = serde_json::to_value(UserResponse::from(profile)).unwrap();
        assert_eq!(json["additionalInfo"]["nohp"], "");
        assert_eq!(json["additionalInfo"]["foto"], "defaultProfile.png");
        assert!(json["additionalInfo"].get("password_hash").is_none());
        assert!(json["additionalInfo"].get("password").is_none());
    }

    #[rstest]
    #[case(Method::GET, "/users")]
    #[case(Method::GET, "/users/6f1c2d0e-0000-4000-8000-000000000001")]
    #[case(Method::PUT, "/users/6f1c2d0e-0000-4000-8000-000000000001")]
    #[case(Method::DELETE, "/users/6f1c2d0e-0000-4000-8000-000000000001")]
    #[case(Method::POST, "/users")]
    #[tokio::test]
    async fn test_requires_token(#[case] method: Method, #[case] uri: &str) {
        let (status, body) = send(
            test_state(),
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_rejects_token_signed_with_other_secret() {
        let state = test_state();
        let foreign = crate::test_support::jwt_service("another-secret-entirely");
        let token = foreign
            .generate_access_token(Uuid::new_v4(), "petani")
            .unwrap();

        let (status, body) = send(
            state,
            Request::builder()
                .uri("/users")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "Invalid or malformed token");
    }

    #[tokio::test]
    async fn test_valid_token_lists_accounts() {
        let state = test_state_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<users::Model>::new()]),
        );
        let token = bearer(&state);

        let (status, body) = send(
            state,
            Request::builder()
                .uri("/users")
                .header("authorization", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_valid_token_reaches_storage() {
        // The test database fails every query, so an admitted request fails there.
        let state = test_state();
        let token = bearer(&state);

        let (status, body) = send(
            state,
            Request::builder()
                .uri("/users")
                .header("authorization", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_register_storage_failure_is_server_error() {
        let state = test_state();
        let token = bearer(&state);

        let (status, body) = send(
            state,
            Request::builder()
                .method(Method::POST)
                .uri("/users")
                .header("authorization", token)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Budi","email":"budi@x.com","password":"secret1","confPassword":"secret1","role":"Petani"}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_register_password_mismatch() {
        let state = test_state();
        let token = bearer(&state);

        let (status, body) = send(
            state,
            Request::builder()
                .method(Method::POST)
                .uri("/users")
                .header("authorization", token)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Budi","email":"budi@x.com","password":"secret1","confPassword":"secret2","role":"Petani"}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_register_unknown_role() {
        let state = test_state();
        let token = bearer(&state);

        let (status, body) = send(
            state,
            Request::builder()
                .method(Method::POST)
                .uri("/users")
                .header("authorization", token)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"name":"Budi","email":"budi@x.com","password":"secret1","confPassword":"secret1","role":"admin"}"#,
                ))
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "unknown role: 'admin'");
    }

    #[tokio::test]
    async fn test_get_with_malformed_identifier_is_not_found() {
        let state = test_state();
        let token = bearer(&state);

        let (status, body) = send(
            state,
            Request::builder()
                .uri("/users/not-a-uuid")
                .header("authorization", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }
}
