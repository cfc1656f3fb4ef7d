use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::db::User;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub username: String,
    pub email: String,
}

impl CreateUserPayload {
    /// Blank fields count as missing.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username is required".to_string());
        }
        if self.email.trim().is_empty() {
            return Err("email is required".to_string());
        }
        Ok(())
    }
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CreateUserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<User>)> {
    let Json(payload) = payload.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
    payload.validate().map_err(Error::BadRequest)?;

    let user = state.store.create(&payload.username, &payload.email).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>> {
    let users = state.store.list_all().await?;

    tracing::debug!(count = users.len(), "listing users");
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::server::router;
    use crate::db::UserStore;
    use crate::error::ErrorResponse;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use tower::ServiceExt;

    async fn test_app() -> Router {
        router(UserStore::in_memory().await.unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const ALICE: &str = r#"{"username":"Alice","email":"alice@example.com"}"#;

    #[tokio::test]
    async fn test_create_user() {
        let app = test_app().await;

        let response = app.oneshot(post_json("/api/users/", ALICE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let user: User = read_json(response).await;
        assert!(!user.id.is_empty());
        assert_eq!(user.username, "Alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_get_users() {
        let app = test_app().await;

        let created = app
            .clone()
            .oneshot(post_json("/api/users/", ALICE))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let alice: User = read_json(created).await;

        let response = app.oneshot(get("/api/users/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let users: Vec<User> = read_json(response).await;
        assert_eq!(users.last(), Some(&alice));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let app = test_app().await;

        let response = app.oneshot(get("/api/users/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let users: Vec<User> = read_json(response).await;
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_two_creates_get_distinct_ids() {
        let app = test_app().await;

        let first: User = read_json(
            app.clone()
                .oneshot(post_json("/api/users/", ALICE))
                .await
                .unwrap(),
        )
        .await;
        let second: User = read_json(
            app.clone()
                .oneshot(post_json(
                    "/api/users/",
                    r#"{"username":"Bob","email":"bob@example.com"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_ne!(first.id, second.id);

        let users: Vec<User> = read_json(app.oneshot(get("/api/users/")).await.unwrap()).await;
        assert_eq!(users, vec![first, second]);
    }

    #[tokio::test]
    async fn test_route_without_trailing_slash() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(post_json("/api/users", ALICE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let users: Vec<User> = read_json(app.oneshot(get("/api/users")).await.unwrap()).await;
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_email_is_bad_request() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(post_json("/api/users/", r#"{"username":"Alice"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.code, "BAD_REQUEST");
        assert_eq!(body.status, 400);

        let users: Vec<User> = read_json(app.oneshot(get("/api/users/")).await.unwrap()).await;
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json("/api/users/", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_username_is_bad_request() {
        let app = test_app().await;

        let response = app
            .oneshot(post_json(
                "/api/users/",
                r#"{"username":"  ","email":"alice@example.com"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "username is required");
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_validate_payload() {
        let ok = CreateUserPayload {
            username: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank_email = CreateUserPayload {
            username: "Alice".to_string(),
            email: String::new(),
        };
        assert_eq!(blank_email.validate(), Err("email is required".to_string()));
    }
}
