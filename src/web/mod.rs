//! Web server: HTML pages, the JSON API, the admin page and media files.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use sea_orm::DatabaseConnection;
use tower_http::services::ServeDir;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing::{error, info};

use crate::media::MediaStore;
use crate::pipeline::ComicPipeline;

mod admin;
mod api;
mod csrf;
mod flash;
mod images;
mod prelude;
mod views;

use admin::{admin_handler, delete_comic_handler};
use api::{comic_json_handler, generate_handler};
use views::{comic_page_handler, generate_form_handler, home_handler, strip_image_handler};

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    db: DatabaseConnection,
    pipeline: Arc<ComicPipeline>,
}

impl AppState {
    fn new(db: DatabaseConnection, pipeline: ComicPipeline) -> Self {
        Self {
            db,
            pipeline: Arc::new(pipeline),
        }
    }
}

fn create_router(media: &MediaStore) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(home_handler))
        .route("/static/styles.css", get(styles_handler))
        .route("/generate/", post(generate_handler))
        .route("/api/comics", post(generate_handler))
        .route("/api/comics/{id}", get(comic_json_handler))
        .route("/comics", post(generate_form_handler))
        .route("/comics/{id}", get(comic_page_handler))
        .route("/comics/{id}/image", get(strip_image_handler))
        .route("/admin/", get(admin_handler))
        .route("/admin/comics/{id}/delete", post(delete_comic_handler));

    let files = ServeDir::new(media.root());
    let router = match media.url_prefix().trim_end_matches('/') {
        "" => router.fallback_service(files),
        prefix if prefix.starts_with('/') => router.nest_service(prefix, files),
        prefix => {
            info!("Media URL prefix {prefix} is not a local path, not serving media files");
            router
        }
    };

    router.layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

/// Binds the listener and serves until the process is stopped.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    db: DatabaseConnection,
    pipeline: ComicPipeline,
) -> Result<(), anyhow::Error> {
    let app = create_router(pipeline.media()).with_state(AppState::new(db, pipeline));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use image::{Rgb, RgbImage};
    use sea_orm::EntityTrait;
    use sea_orm_migration::MigratorTrait;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::db::entities::comic_strips;
    use crate::providers::{PanelImageGenerator, ProviderError, ScriptGenerator};

    const SCRIPT: &str = "Panel 1:\nScene: Ama counts mangoes at the market.\nDialogue:\n- Ama: One, two, three!\nNarration: Counting helps.\n\n\
Panel 2:\nScene: Kofi brings more mangoes.\nDialogue:\n- Kofi: Here are two more.\nNarration: Adding means putting together.\n\n\
Panel 3:\nScene: They count together.\nDialogue:\n- Ama: Five mangoes!\nNarration: None\n\n\
Panel 4:\nScene: Grandma smiles.\nDialogue:\n- Grandma: Well done.\nNarration: Three plus two is five.";

    struct StubScript(Option<&'static str>);

    #[async_trait]
    impl ScriptGenerator for StubScript {
        async fn generate_script(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.0.map(str::to_string).ok_or(ProviderError::Empty("script"))
        }
    }

    #[derive(Clone, Copy)]
    enum StubImages {
        Working,
        Failing,
        HeaderOnly,
    }

    #[async_trait]
    impl PanelImageGenerator for StubImages {
        async fn generate_image(&self, _prompt: &str) -> Result<Vec<u8>, ProviderError> {
            match self {
                StubImages::Working => {
                    let image = RgbImage::from_pixel(64, 96, Rgb([30, 120, 200]));
                    Ok(crate::media::encode_png(&image).expect("encode panel"))
                }
                StubImages::Failing => Err(ProviderError::NotConfigured("stub")),
                StubImages::HeaderOnly => Ok(b"\x89PNG\r\n\x1a\n".to_vec()),
            }
        }
    }

    async fn setup(script: Option<&'static str>, images: StubImages) -> (Router, AppState, TempDir) {
        let db = crate::db::connect_test_db()
            .await
            .expect("connect test db");
        crate::db::migrations::Migrator::up(&db, None)
            .await
            .expect("run migrations");
        let dir = tempfile::tempdir().expect("tempdir");
        let media = MediaStore::new(dir.path().to_path_buf(), "/media/");
        let pipeline = ComicPipeline::new(
            Arc::new(StubScript(script)),
            Arc::new(images),
            media,
            4,
        );
        let state = AppState::new(db, pipeline);
        let app = create_router(state.pipeline.media()).with_state(state.clone());
        (app, state, dir)
    }

    async fn read_body(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request")
    }

    #[tokio::test]
    async fn generate_returns_script_and_strip() {
        let (app, state, dir) = setup(Some(SCRIPT), StubImages::Working).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "/generate/",
                json!({"prompt": "Learn addition", "cultural_elements": ["mangoes"]}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_str(&read_body(response).await).expect("json body");

        assert!(!body["script"].as_str().unwrap_or_default().is_empty());
        assert_eq!(body["panels"].as_array().map(Vec::len), Some(4));
        assert_eq!(body["warning"], Value::Null);

        let image_url = body["image_url"].as_str().expect("image_url");
        let relative = image_url.strip_prefix("/media/").expect("media prefix");
        assert!(dir.path().join(relative).exists());

        let served = app.oneshot(get_request(image_url)).await.expect("media");
        assert_eq!(served.status(), StatusCode::OK);

        let stored = comic_strips::Entity::find()
            .all(&state.db)
            .await
            .expect("list comics");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].prompt, "Learn addition");
        assert_eq!(stored[0].placeholder_count, 0);
    }

    #[tokio::test]
    async fn api_alias_generates_too() {
        let (app, _state, _dir) = setup(Some(SCRIPT), StubImages::Working).await;
        let response = app
            .oneshot(json_request("/api/comics", json!({"prompt": "Shapes"})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn failed_images_still_produce_a_strip() {
        let (app, _state, dir) = setup(Some(SCRIPT), StubImages::Failing).await;

        let response = app
            .oneshot(json_request("/generate/", json!({"prompt": "Learn addition"})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_str(&read_body(response).await).expect("json body");

        let panels = body["panels"].as_array().expect("panels");
        assert_eq!(panels.len(), 4);
        assert!(panels.iter().all(|panel| panel["placeholder"] == json!(true)));
        assert!(body["warning"].as_str().is_some());

        let relative = body["image_url"]
            .as_str()
            .and_then(|url| url.strip_prefix("/media/"))
            .expect("image_url");
        assert!(dir.path().join(relative).exists());
    }

    #[tokio::test]
    async fn truncated_images_are_reported_as_placeholders() {
        let (app, state, _dir) = setup(Some(SCRIPT), StubImages::HeaderOnly).await;

        let response = app
            .oneshot(json_request("/generate/", json!({"prompt": "Learn addition"})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = serde_json::from_str(&read_body(response).await).expect("json body");

        assert_eq!(
            body["warning"],
            "Image generation failed for 4 of 4 panel(s), placeholders were used"
        );
        let placeholder_url = state
            .pipeline
            .media()
            .url_for(state.pipeline.media().placeholder_relative());
        let panels = body["panels"].as_array().expect("panels");
        assert!(panels.iter().all(|panel| panel["placeholder"] == json!(true)
            && panel["image_url"] == json!(placeholder_url)));

        let stored = comic_strips::Entity::find()
            .all(&state.db)
            .await
            .expect("list comics");
        assert_eq!(stored[0].placeholder_count, 4);
    }

    #[tokio::test]
    async fn script_failure_is_bad_gateway() {
        let (app, state, _dir) = setup(None, StubImages::Working).await;

        let response = app
            .oneshot(json_request("/generate/", json!({"prompt": "Learn addition"})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = serde_json::from_str(&read_body(response).await).expect("json body");
        assert!(body["error"].as_str().is_some());

        let stored = comic_strips::Entity::find()
            .all(&state.db)
            .await
            .expect("list comics");
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn missing_prompt_is_bad_request() {
        let (app, _state, _dir) = setup(Some(SCRIPT), StubImages::Working).await;

        let response = app
            .clone()
            .oneshot(json_request("/generate/", json!({"prompt": "   "})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate/")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .expect("build request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stored_comic_can_be_fetched() {
        let (app, _state, _dir) = setup(Some(SCRIPT), StubImages::Working).await;

        let response = app
            .clone()
            .oneshot(json_request("/generate/", json!({"prompt": "Learn addition"})))
            .await
            .expect("response");
        let body: Value = serde_json::from_str(&read_body(response).await).expect("json body");
        let id = body["id"].as_i64().expect("id");

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/comics/{id}")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let fetched: Value = serde_json::from_str(&read_body(response).await).expect("json body");
        assert_eq!(fetched["panels"][0]["scene"], "Ama counts mangoes at the market.");
        assert_eq!(fetched["panels"][0]["placeholder"], json!(false));
        assert_eq!(fetched, body);

        let page = app
            .clone()
            .oneshot(get_request(&format!("/comics/{id}")))
            .await
            .expect("response");
        assert_eq!(page.status(), StatusCode::OK);
        assert!(read_body(page).await.contains("Kofi brings more mangoes."));

        let image = app
            .clone()
            .oneshot(get_request(&format!("/comics/{id}/image")))
            .await
            .expect("response");
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(
            image.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("image/png")
        );

        let missing = app
            .oneshot(get_request("/api/comics/9999"))
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn form_submission_redirects_to_comic_page() {
        let (app, _state, _dir) = setup(Some(SCRIPT), StubImages::Working).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/comics")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "prompt=Learn+addition&topic=market&cultural_elements=kente%2C+fufu",
                    ))
                    .expect("build request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("location")
            .to_string();
        assert!(location.starts_with("/comics/"));

        let home = app.oneshot(get_request("/")).await.expect("response");
        assert_eq!(home.status(), StatusCode::OK);
        assert!(read_body(home).await.contains(&location));
    }

    #[tokio::test]
    async fn home_and_styles_render() {
        let (app, _state, _dir) = setup(Some(SCRIPT), StubImages::Working).await;

        let home = app.clone().oneshot(get_request("/")).await.expect("response");
        assert_eq!(home.status(), StatusCode::OK);
        assert!(read_body(home).await.contains("name=\"prompt\""));

        let styles = app
            .oneshot(get_request("/static/styles.css"))
            .await
            .expect("response");
        assert_eq!(styles.status(), StatusCode::OK);
        assert_eq!(
            styles.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/css")
        );
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookie| cookie.split(';').next())
            .expect("session cookie")
            .to_string()
    }

    fn csrf_from(html: &str) -> String {
        let marker = "name=\"csrf_token\" value=\"";
        let start = html.find(marker).expect("csrf field") + marker.len();
        html[start..]
            .split('"')
            .next()
            .expect("csrf value")
            .to_string()
    }

    fn delete_request(id: i32, cookie: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/admin/comics/{id}/delete"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(COOKIE, cookie)
            .body(Body::from(format!("csrf_token={token}")))
            .expect("build request")
    }

    #[tokio::test]
    async fn admin_delete_requires_csrf_and_removes_files() {
        let (app, state, dir) = setup(Some(SCRIPT), StubImages::Working).await;

        let response = app
            .clone()
            .oneshot(json_request("/generate/", json!({"prompt": "Learn addition"})))
            .await
            .expect("response");
        let body: Value = serde_json::from_str(&read_body(response).await).expect("json body");
        let id = i32::try_from(body["id"].as_i64().expect("id")).expect("id fits");
        let strip = dir.path().join(
            body["image_url"]
                .as_str()
                .and_then(|url| url.strip_prefix("/media/"))
                .expect("image_url"),
        );
        let panels: Vec<_> = body["panels"]
            .as_array()
            .expect("panels")
            .iter()
            .filter_map(|panel| panel["image_url"].as_str())
            .filter_map(|url| url.strip_prefix("/media/"))
            .map(|relative| dir.path().join(relative))
            .collect();
        assert_eq!(panels.len(), 4);
        assert!(panels.iter().all(|panel| panel.exists()));

        let admin = app
            .clone()
            .oneshot(get_request("/admin/"))
            .await
            .expect("response");
        assert_eq!(admin.status(), StatusCode::OK);
        let cookie = session_cookie(&admin);
        let html = read_body(admin).await;
        assert!(html.contains("Learn addition"));
        let token = csrf_from(&html);

        let rejected = app
            .clone()
            .oneshot(delete_request(id, &cookie, "nope"))
            .await
            .expect("response");
        assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
        assert!(strip.exists());

        let deleted = app
            .clone()
            .oneshot(delete_request(id, &cookie, &token))
            .await
            .expect("response");
        assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
        assert!(!strip.exists());
        assert!(panels.iter().all(|panel| !panel.exists()));
        assert!(
            dir.path()
                .join(state.pipeline.media().placeholder_relative())
                .exists()
        );
        assert!(
            comic_strips::Entity::find_by_id(id)
                .one(&state.db)
                .await
                .expect("lookup")
                .is_none()
        );

        let admin = app
            .oneshot(
                Request::builder()
                    .uri("/admin/")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("response");
        let html = read_body(admin).await;
        assert!(html.contains(&format!("Comic {id} and its images were deleted.")));
    }
}
