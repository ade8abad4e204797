//! HTTP API integration tests
//!
//! Each test builds the router over an in-memory database and a temporary
//! storage root, then drives it with `oneshot` requests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use closet_api::db::items::{self, ItemUpdate};
use closet_api::db::users;
use closet_api::storage::ItemStorage;
use closet_api::vision::{Classifier, Prediction, VisionError};
use closet_api::{build_router, AppState};
use closet_common::{Formality, OutfitPart, Season};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "closet-test-boundary";

/// Classifier returning a fixed answer
struct FixedClassifier(Prediction);

#[async_trait]
impl Classifier for FixedClassifier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn classify(&self, image_path: &Path) -> Result<Prediction, VisionError> {
        assert!(image_path.exists(), "classifier got a missing file");
        Ok(self.0.clone())
    }
}

/// Classifier whose upstream is always down
struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn classify(&self, _image_path: &Path) -> Result<Prediction, VisionError> {
        Err(VisionError::Network("connection refused".into()))
    }
}

fn navy_coat() -> Prediction {
    Prediction {
        outfit_part: OutfitPart::Outerwear,
        category: "coat".into(),
        color: "navy".into(),
        season: Season::Winter,
        formality: Formality::SemiFormal,
    }
}

struct TestApp {
    app: Router,
    db: SqlitePool,
    storage: ItemStorage,
    _temp: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with(|state| state).await
    }

    async fn with(configure: impl FnOnce(AppState) -> AppState) -> Self {
        let temp = TempDir::new().unwrap();
        let db = closet_common::db::init_memory_database().await.unwrap();
        let storage = ItemStorage::new(temp.path().join("storage"));
        let state = configure(AppState::new(db.clone(), storage.clone()));

        Self {
            app: build_router(state),
            db,
            storage,
            _temp: temp,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn upload(&self, user_id: i64, field: &str, filename: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                b = BOUNDARY,
                f = field,
                n = filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/users/{}/items", user_id))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn user(&self, name: &str) -> i64 {
        users::create_user(&self.db, name, None, None).await.unwrap().id
    }

    /// Insert a classified item directly through the store
    async fn item(&self, user_id: i64, part: OutfitPart, color: &str, formality: Formality, season: Season) -> i64 {
        let item = items::create_item(&self.db, user_id, "x.jpg", &format!("{}/items/x.jpg", user_id))
            .await
            .unwrap();
        let update = ItemUpdate {
            outfit_part: Some(part),
            primary_color: Some(color.to_string()),
            formality: Some(formality),
            season: Some(season),
            ..Default::default()
        };
        items::update_fields(&self.db, item.id, &update).await.unwrap();
        item.id
    }
}

fn slot_id(body: &Value, slot: &str) -> Option<i64> {
    body[slot]["id"].as_i64()
}

// ========================================
// Health and users
// ========================================

#[tokio::test]
async fn test_health_reports_module() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "closet-api");
    assert_eq!(body["classifier"], "disabled");
}

#[tokio::test]
async fn test_user_lifecycle() {
    let app = TestApp::new().await;

    let (status, user) = app
        .json(Method::POST, "/users", json!({"display_name": " Ana ", "city": "Porto"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["display_name"], "Ana");
    let id = user["id"].as_i64().unwrap();

    let (status, listed) = app.get("/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app.delete(&format!("/users/{}", id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/users/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_blank_user_name_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(Method::POST, "/users", json!({"display_name": "   "}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ========================================
// Uploads and item maintenance
// ========================================

#[tokio::test]
async fn test_upload_stores_file_and_serves_image() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;

    let (status, first) = app.upload(user, "file", "shirt.jpg", b"first image").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["original_filename"], "shirt.jpg");
    assert_eq!(first["stored_path"], format!("{}/items/shirt.jpg", user));
    assert_eq!(first["image_url"], format!("/images/{}/items/shirt.jpg", user));
    assert_eq!(first["verified"], false);
    assert!(first["outfit_part"].is_null());

    let (_, second) = app.upload(user, "file", "shirt.jpg", b"second image").await;
    assert_eq!(second["stored_path"], format!("{}/items/shirt_1.jpg", user));

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(first["image_url"].as_str().unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"first image");

    let (_, listed) = app.get(&format!("/users/{}/items", user)).await;
    let ids: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn test_upload_path_traversal_is_flattened() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;

    let (status, item) = app.upload(user, "file", "../../escape.jpg", b"x").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["stored_path"], format!("{}/items/escape.jpg", user));
}

#[tokio::test]
async fn test_upload_url_breaking_filename_still_serves() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;

    let (status, item) = app.upload(user, "file", "a#b?c%d.jpg", b"odd name").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["original_filename"], "a#b?c%d.jpg");
    assert_eq!(item["image_url"], format!("/images/{}/items/a_b_c_d.jpg", user));

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(item["image_url"].as_str().unwrap())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"odd name");
}

#[tokio::test]
async fn test_upload_removes_blob_when_insert_fails() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    sqlx::query("DROP TABLE items").execute(&app.db).await.unwrap();

    let (status, _) = app.upload(user, "file", "shirt.jpg", b"orphan").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let blob = app.storage.absolute_path(&format!("{}/items/shirt.jpg", user));
    assert!(!blob.exists(), "blob left behind at {}", blob.display());
}

#[tokio::test]
async fn test_upload_errors() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;

    let (status, _) = app.upload(user, "photo", "a.jpg", b"x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.upload(user, "file", "a.jpg", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.upload(999, "file", "a.jpg", b"x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_auto_classifies() {
    let app = TestApp::with(|state| {
        state
            .with_classifier(Arc::new(FixedClassifier(navy_coat())))
            .with_auto_classify(true)
    })
    .await;
    let user = app.user("Ana").await;

    let (status, item) = app.upload(user, "file", "coat.jpg", b"img").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["outfit_part"], "outerwear");
    assert_eq!(item["category"], "coat");
    assert_eq!(item["primary_color"], "navy");
    assert_eq!(item["season"], "winter");
    assert_eq!(item["formality"], "semi_formal");
    assert_eq!(item["source"], "vision");
}

#[tokio::test]
async fn test_upload_survives_classifier_failure() {
    let app = TestApp::with(|state| {
        state
            .with_classifier(Arc::new(FailingClassifier))
            .with_auto_classify(true)
    })
    .await;
    let user = app.user("Ana").await;

    let (status, item) = app.upload(user, "file", "coat.jpg", b"img").await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(item["outfit_part"].is_null());
    assert_eq!(item["source"], "manual");
}

#[tokio::test]
async fn test_classify_endpoint_status_codes() {
    let disabled = TestApp::new().await;
    let user = disabled.user("Ana").await;
    let (_, item) = disabled.upload(user, "file", "a.jpg", b"img").await;
    let (status, _) = disabled
        .json(Method::POST, &format!("/items/{}/classify", item["id"]), json!({}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let failing = TestApp::with(|s| s.with_classifier(Arc::new(FailingClassifier))).await;
    let user = failing.user("Ana").await;
    let (_, item) = failing.upload(user, "file", "a.jpg", b"img").await;
    let (status, body) = failing
        .json(Method::POST, &format!("/items/{}/classify", item["id"]), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

    let working =
        TestApp::with(|s| s.with_classifier(Arc::new(FixedClassifier(navy_coat())))).await;
    let user = working.user("Ana").await;
    let (_, item) = working.upload(user, "file", "a.jpg", b"img").await;
    let (status, body) = working
        .json(Method::POST, &format!("/items/{}/classify", item["id"]), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "coat");

    let (status, _) = working.json(Method::POST, "/items/999/classify", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_item() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    let (_, item) = app.upload(user, "file", "a.jpg", b"img").await;
    let uri = format!("/items/{}", item["id"]);

    let (status, patched) = app
        .json(
            Method::PATCH,
            &uri,
            json!({"outfit_part": "Top", "color": "Grey", "formality": "business casual", "verified": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["outfit_part"], "top");
    assert_eq!(patched["primary_color"], "gray");
    assert_eq!(patched["formality"], "smart_casual");
    assert_eq!(patched["verified"], true);
    assert_eq!(patched["source"], "manual");

    let (status, _) = app.json(Method::PATCH, &uri, json!({"season": "monsoon"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unchanged) = app.get(&uri).await;
    assert_eq!(unchanged["formality"], "smart_casual");

    let (status, _) = app.json(Method::PATCH, "/items/999", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_item_removes_file() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    let (_, item) = app.upload(user, "file", "a.jpg", b"img").await;
    let file = app.storage.absolute_path(item["stored_path"].as_str().unwrap());
    assert!(file.exists());

    let (status, body) = app.delete(&format!("/items/{}", item["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(!file.exists());

    let (status, _) = app.delete(&format!("/items/{}", item["id"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_removes_stored_images() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    app.upload(user, "file", "a.jpg", b"img").await;
    let user_dir = app.storage.root().join(user.to_string());
    assert!(user_dir.exists());

    app.delete(&format!("/users/{}", user)).await;
    assert!(!user_dir.exists());
    assert!(items::list_items(&app.db, user).await.unwrap().is_empty());
}

// ========================================
// Suggestions
// ========================================

#[tokio::test]
async fn test_suggest_single_top_and_bottom() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    let top = app.item(user, OutfitPart::Top, "blue", Formality::Casual, Season::AllSeason).await;
    let bottom = app.item(user, OutfitPart::Bottom, "black", Formality::Casual, Season::AllSeason).await;

    let (status, body) = app
        .get(&format!("/users/{}/outfits/suggest?season=any&formality=any", user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot_id(&body, "top"), Some(top));
    assert_eq!(slot_id(&body, "bottom"), Some(bottom));
    assert!(body["outer"].is_null());
    assert!(body["shoes"].is_null());
    assert_eq!(body["top"]["image_url"], format!("/images/{}/items/x.jpg", user));
    assert_eq!(body["top"]["primary_color"], "blue");
}

#[tokio::test]
async fn test_suggest_anchor_avoids_color_clash() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    app.item(user, OutfitPart::Top, "red", Formality::Casual, Season::AllSeason).await;
    let black_top = app.item(user, OutfitPart::Top, "black", Formality::SmartCasual, Season::AllSeason).await;
    let red_bottom = app.item(user, OutfitPart::Bottom, "red", Formality::Casual, Season::AllSeason).await;

    for _ in 0..30 {
        let (_, body) = app
            .get(&format!("/users/{}/outfits/suggest?anchor_ids={}", user, red_bottom))
            .await;
        assert_eq!(slot_id(&body, "bottom"), Some(red_bottom));
        assert_eq!(slot_id(&body, "top"), Some(black_top));
    }
}

#[tokio::test]
async fn test_suggest_exclusion_beats_anchor() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    let top = app.item(user, OutfitPart::Top, "blue", Formality::Casual, Season::AllSeason).await;
    let bottom = app.item(user, OutfitPart::Bottom, "black", Formality::Casual, Season::AllSeason).await;

    let (status, body) = app
        .get(&format!(
            "/users/{}/outfits/suggest?anchor_ids={t}&exclude_ids={t},oops",
            user,
            t = top
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["top"].is_null());
    assert_eq!(slot_id(&body, "bottom"), Some(bottom));
}

#[tokio::test]
async fn test_suggest_winter_adds_outerwear() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    app.item(user, OutfitPart::Top, "white", Formality::Casual, Season::AllSeason).await;
    app.item(user, OutfitPart::Bottom, "blue", Formality::Casual, Season::FallWinter).await;
    let coat = app.item(user, OutfitPart::Outerwear, "brown", Formality::Casual, Season::Winter).await;
    app.item(user, OutfitPart::Outerwear, "green", Formality::Casual, Season::Summer).await;

    let (_, body) = app
        .get(&format!("/users/{}/outfits/suggest?season=winter", user))
        .await;
    assert_eq!(slot_id(&body, "outer"), Some(coat));

    let (_, body) = app
        .get(&format!("/users/{}/outfits/suggest?season=summer", user))
        .await;
    assert!(body["outer"].is_null());
}

#[tokio::test]
async fn test_suggest_empty_wardrobe() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;

    let (status, body) = app.get(&format!("/users/{}/outfits/suggest", user)).await;
    assert_eq!(status, StatusCode::OK);
    for slot in ["top", "bottom", "outer", "shoes"] {
        assert!(body[slot].is_null(), "{} should be null", slot);
    }
}

#[tokio::test]
async fn test_suggest_unknown_season_keeps_all_season_items() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    app.item(user, OutfitPart::Top, "white", Formality::Casual, Season::Summer).await;
    let tee = app.item(user, OutfitPart::Top, "blue", Formality::Casual, Season::AllSeason).await;
    let jeans = app.item(user, OutfitPart::Bottom, "black", Formality::Casual, Season::AllSeason).await;

    for _ in 0..5 {
        let (status, body) = app
            .get(&format!("/users/{}/outfits/suggest?season=monsoon", user))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(slot_id(&body, "top"), Some(tee));
        assert_eq!(slot_id(&body, "bottom"), Some(jeans));
        assert!(body["outer"].is_null());
    }
}

#[tokio::test]
async fn test_suggest_unknown_formality_ranks_as_casual() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    app.item(user, OutfitPart::Top, "white", Formality::Formal, Season::AllSeason).await;
    let polo = app.item(user, OutfitPart::Top, "navy", Formality::SmartCasual, Season::AllSeason).await;

    for _ in 0..5 {
        let (status, body) = app
            .get(&format!("/users/{}/outfits/suggest?formality=black-tie", user))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(slot_id(&body, "top"), Some(polo));
    }

    let (status, _) = app.get("/users/999/outfits/suggest?season=monsoon").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========================================
// Saved outfits and feedback
// ========================================

#[tokio::test]
async fn test_save_outfit_checks_ownership() {
    let app = TestApp::new().await;
    let ana = app.user("Ana").await;
    let ben = app.user("Ben").await;
    let ana_top = app.item(ana, OutfitPart::Top, "blue", Formality::Casual, Season::AllSeason).await;
    let ben_bottom = app.item(ben, OutfitPart::Bottom, "black", Formality::Casual, Season::AllSeason).await;

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/users/{}/outfits", ana),
            json!({"top_id": ana_top, "bottom_id": ben_bottom}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, saved) = app
        .json(
            Method::POST,
            &format!("/users/{}/outfits", ana),
            json!({"top_id": ana_top, "season": "winter", "score": 0.8}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["top_id"], ana_top);
    assert_eq!(saved["season"], "winter");

    let (_, listed) = app.get(&format!("/users/{}/outfits", ana)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_feedback_flow() {
    let app = TestApp::new().await;
    let user = app.user("Ana").await;
    let (_, outfit) = app
        .json(Method::POST, &format!("/users/{}/outfits", user), json!({}))
        .await;
    let uri = format!("/outfits/{}/feedback", outfit["id"]);

    let (status, _) = app.json(Method::POST, &uri, json!({"reaction": "meh"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, feedback) = app
        .json(Method::POST, &uri, json!({"reaction": "like", "comment": "sharp"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(feedback["reaction"], "like");
    assert_eq!(feedback["user_id"], user);

    let (_, listed) = app.get(&uri).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app
        .json(Method::POST, "/outfits/999/feedback", json!({"reaction": "like"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ========================================
// CORS
// ========================================

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = TestApp::with(|s| s.with_cors_origins(vec!["http://localhost:5173".into()])).await;

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/users")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
}
