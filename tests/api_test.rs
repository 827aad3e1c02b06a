//! REST clients against an in-process backend

mod common;

use anyhow::Result;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{anonymous, http, projects_client, serve, Hits};
use crucibai::api::{DeployProvider, Endpoints, ProjectsClient};
use crucibai::auth::AuthSession;
use crucibai::error::Error;
use crucibai::generation::{
    GenerationBackend, GenerationRequest, HttpGenerationClient, ModelChoice, RetryPolicy,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TOKEN: &str = "tok-123";

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn auth_routes() -> Router {
    Router::new()
        .route(
            "/api/auth/login",
            post(|Json(body): Json<serde_json::Value>| async move {
                if body["password"] == "hunter2" {
                    Ok(Json(json!({
                        "token": TOKEN,
                        "user": {"id": "u1", "email": body["email"], "plan": "free"}
                    })))
                } else {
                    Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid credentials"}))))
                }
            }),
        )
        .route(
            "/api/auth/me",
            get(|headers: HeaderMap| async move {
                match bearer(&headers) {
                    Some(TOKEN) => Ok(Json(json!({"email": "dev@example.com", "token_balance": 5000}))),
                    _ => Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token expired"})))),
                }
            }),
        )
}

fn request() -> GenerationRequest {
    GenerationRequest {
        message: "build a todo app".to_string(),
        session_id: "workspace_test".to_string(),
        model: ModelChoice::Claude,
    }
}

#[tokio::test]
async fn test_login_persists_token_and_logout_clears_it() -> Result<()> {
    let base = serve(auth_routes()).await?;
    let dir = TempDir::new()?;
    let token_file = dir.path().join("nested").join("token");

    let auth = AuthSession::new(http(), Endpoints::new(&base)?, Some(token_file.clone()));
    let user = auth.login("dev@example.com", "hunter2").await?;
    assert_eq!(user.email, "dev@example.com");
    assert_eq!(user.plan.as_deref(), Some("free"));
    assert_eq!(std::fs::read_to_string(&token_file)?, TOKEN);
    assert_eq!(auth.bearer().as_deref(), Some(TOKEN));

    // a fresh process picks the token up again
    let resumed = AuthSession::new(http(), Endpoints::new(&base)?, Some(token_file.clone()));
    let profile = resumed.restore().await?;
    assert_eq!(profile.and_then(|p| p.token_balance), Some(5000));
    assert_eq!(resumed.me().await?.email, "dev@example.com");

    resumed.logout().await?;
    assert!(!token_file.exists());
    assert!(!resumed.is_signed_in());
    assert!(matches!(resumed.me().await, Err(Error::NotSignedIn)));
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() -> Result<()> {
    let base = serve(auth_routes()).await?;
    let auth = AuthSession::new(http(), Endpoints::new(&base)?, None);

    match auth.login("dev@example.com", "nope").await {
        Err(Error::Unauthorized(message)) => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected unauthorized, got {other:?}"),
    }
    assert!(!auth.is_signed_in());
    Ok(())
}

#[tokio::test]
async fn test_rejected_stored_token_is_discarded() -> Result<()> {
    let base = serve(auth_routes()).await?;
    let dir = TempDir::new()?;
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "stale-token\n")?;

    let auth = AuthSession::new(http(), Endpoints::new(&base)?, Some(token_file.clone()));
    assert!(auth.restore().await?.is_none());
    assert!(!auth.is_signed_in());
    assert!(!token_file.exists());
    Ok(())
}

#[tokio::test]
async fn test_generation_retries_unavailable_backend() -> Result<()> {
    let hits = Hits::default();
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/ai/chat",
        post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
            let counter = counter.clone();
            async move {
                assert_eq!(bearer(&headers), Some(TOKEN));
                assert_eq!(body["model"], "claude");
                assert_eq!(body["session_id"], "workspace_test");
                if counter.record() == 0 {
                    return Err((StatusCode::SERVICE_UNAVAILABLE, "warming up"));
                }
                Ok(Json(json!({
                    "response": "export default function App() {}",
                    "model_used": "claude-sonnet",
                    "tokens_used": 321
                })))
            }
        }),
    );
    let base = serve(app).await?;
    let endpoints = Endpoints::new(&base)?;
    let auth = Arc::new(AuthSession::with_token(http(), endpoints.clone(), TOKEN));
    let client = HttpGenerationClient::new(
        http(),
        endpoints,
        auth,
        RetryPolicy::new(2, Duration::from_millis(10)),
    );

    let response = client.generate(&request()).await?;
    assert_eq!(response.model_used.as_deref(), Some("claude-sonnet"));
    assert_eq!(response.tokens_used, Some(321));
    assert_eq!(hits.count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_generation_retries_timed_out_attempt() -> Result<()> {
    let hits = Hits::default();
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/ai/chat",
        post(move || {
            let counter = counter.clone();
            async move {
                if counter.record() == 0 {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
                Json(json!({"response": "export default function App() {}"}))
            }
        }),
    );
    let base = serve(app).await?;
    let (endpoints, auth) = anonymous(&base)?;
    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()?;
    let client = HttpGenerationClient::new(
        impatient,
        endpoints,
        auth,
        RetryPolicy::new(2, Duration::from_millis(10)),
    );

    let response = client.generate(&request()).await?;
    assert_eq!(response.response, "export default function App() {}");
    assert_eq!(hits.count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_generation_client_error_is_not_retried() -> Result<()> {
    let hits = Hits::default();
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/ai/chat",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.record();
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"detail": "Message too long"})),
                )
            }
        }),
    );
    let base = serve(app).await?;
    let (endpoints, auth) = anonymous(&base)?;
    let client = HttpGenerationClient::new(
        http(),
        endpoints,
        auth,
        RetryPolicy::new(3, Duration::from_millis(10)),
    );

    match client.generate(&request()).await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Message too long");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    assert_eq!(hits.count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_download_archive() -> Result<()> {
    let app = Router::new().route(
        "/api/projects/{id}/deploy/zip",
        get(|axum::extract::Path(id): axum::extract::Path<String>| async move {
            if id == "done" {
                Ok(b"PK\x03\x04fake".to_vec())
            } else {
                Err((StatusCode::NOT_FOUND, Json(json!({"detail": "No snapshot"}))))
            }
        }),
    );
    let base = serve(app).await?;
    let projects = projects_client(&base)?;
    let dir = TempDir::new()?;

    let dest = dir.path().join("out").join("done.zip");
    let written = projects.download_archive("done", &dest).await?;
    assert_eq!(written, 8);
    assert_eq!(std::fs::read(&dest)?, b"PK\x03\x04fake");

    let missing = projects
        .download_archive("building", &dir.path().join("building.zip"))
        .await;
    assert!(matches!(missing, Err(Error::NoDeploySnapshot(id)) if id == "building"));
    Ok(())
}

#[tokio::test]
async fn test_deploy_reports_url_or_missing_token() -> Result<()> {
    let app = Router::new().route(
        "/api/projects/{id}/deploy/{provider}",
        post(
            |axum::extract::Path((id, provider)): axum::extract::Path<(String, String)>| async move {
                match provider.as_str() {
                    "vercel" => Ok(Json(json!({"url": format!("https://{id}.vercel.app")}))),
                    _ => Err((
                        StatusCode::PAYMENT_REQUIRED,
                        Json(json!({"detail": "Add your Netlify token in Settings"})),
                    )),
                }
            },
        ),
    );
    let base = serve(app).await?;
    let (endpoints, auth) = anonymous(&base)?;
    let projects = ProjectsClient::new(http(), endpoints, auth);

    let live = projects.deploy("p1", DeployProvider::Vercel).await?;
    assert_eq!(live.url.as_deref(), Some("https://p1.vercel.app"));

    match projects.deploy("p1", DeployProvider::Netlify).await {
        Err(Error::DeployTokenMissing(message)) => assert!(message.contains("Netlify token")),
        other => panic!("expected missing token, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_status_without_project_body() -> Result<()> {
    let app = Router::new().route("/api/projects/{id}", get(|| async { Json(json!({})) }));
    let base = serve(app).await?;
    assert!(projects_client(&base)?.status("p1").await?.is_none());
    Ok(())
}
