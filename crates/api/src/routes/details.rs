//! Read-only role detail routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use super::users::parse_uuid;
use crate::{AppState, error::ApiError};
use agrichain_core::identity::RoleDetail;

/// Creates the role detail routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/details/{role}", get(list_details))
        .route("/details/{role}/{uuid}", get(get_detail))
}

/// GET `/details/{role}`
/// List every detail record of one role.
async fn list_details(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<Vec<RoleDetail>>, ApiError> {
    let details = state.identity_service().list_details(&role).await?;
    Ok(Json(details))
}

/// GET `/details/{role}/{uuid}`
/// Get one detail record of one role.
async fn get_detail(
    State(state): State<AppState>,
    Path((role, uuid)): Path<(String, String)>,
) -> Result<Json<RoleDetail>, ApiError> {
    let id = parse_uuid(&uuid)?;
    let detail = state.identity_service().get_detail(&role, id).await?;
    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{bearer, send, test_state};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let state = test_state();
        let token = bearer(&state);

        let (status, body) = send(
            state,
            Request::builder()
                .uri("/details/nelayan")
                .header("authorization", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "unknown role: 'nelayan'");
    }

    #[tokio::test]
    async fn test_requires_token() {
        let (status, _) = send(
            test_state(),
            Request::builder()
                .uri("/details/petani")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
