use axum::{body::Body, Router};
use greenlight_app::{
    api_router,
    state::{AppConfig, AppState},
};
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt as _;
use tracing::info;
use tracing_test::traced_test;

async fn test_app() -> Router {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    greenlight_dal::MIGRATOR.run(&pool).await.unwrap();
    let config = AppConfig {
        environment: "testing".to_string(),
        ..Default::default()
    };
    api_router().with_state(AppState::new(config, pool))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    info!("{status}: {value}");
    (status, value)
}

async fn create_movie(app: &Router, title: &str, year: i32, genres: &[&str]) -> Value {
    let payload = json!({"title": title, "year": year, "runtime": "100 mins", "genres": genres});
    let (status, body) = call(app, Method::POST, "/v1/movies", Some(payload), &[]).await;
    assert_eq!(status, StatusCode::CREATED);
    body["movie"].clone()
}

#[tokio::test]
#[traced_test]
async fn test_healthcheck() {
    let app = test_app().await;
    let (status, body) = call(&app, Method::GET, "/v1/healthcheck", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "available");
    assert_eq!(body["system_info"]["environment"], "testing");
}

#[tokio::test]
#[traced_test]
async fn test_movie_crud() {
    let app = test_app().await;

    let movie = create_movie(&app, "Moana", 2016, &["animation", "adventure"]).await;
    assert_eq!(movie["version"], 1);
    assert_eq!(movie["runtime"], "100 mins");
    assert!(movie.get("created_at").is_none());
    let id = movie["id"].as_i64().unwrap();
    let url = format!("/v1/movies/{id}");

    let (status, body) = call(&app, Method::GET, &url, None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movie"]["title"], "Moana");

    let (status, body) = call(
        &app,
        Method::PATCH,
        &url,
        Some(json!({"runtime": "107 mins"})),
        &[("X-Expected-Version", "1")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movie"]["runtime"], "107 mins");
    assert_eq!(body["movie"]["title"], "Moana");
    assert_eq!(body["movie"]["version"], 2);

    // client saw version 1, record is at 2 now
    let (status, body) = call(
        &app,
        Method::PATCH,
        &url,
        Some(json!({"title": "Vaiana"})),
        &[("X-Expected-Version", "1")],
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("edit conflict"));

    let (status, _) = call(&app, Method::DELETE, &url, None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::DELETE, &url, None, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = call(&app, Method::GET, &url, None, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "the requested resource could not be found"
    );
}

#[tokio::test]
#[traced_test]
async fn test_validation_errors() {
    let app = test_app().await;

    let payload = json!({"title": "", "year": 1500, "runtime": "-3 mins", "genres": ["x", "x"]});
    let (status, body) = call(&app, Method::POST, "/v1/movies", Some(payload), &[]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["title"], "must be provided");
    assert_eq!(body["error"]["year"], "must be greater than 1888");
    assert_eq!(body["error"]["runtime"], "must be a positive integer");
    assert_eq!(body["error"]["genres"], "must not contain duplicate values");

    let payload = json!({"title": "Moana", "year": 2016, "runtime": 107, "genres": ["animation"]});
    let (status, _) = call(&app, Method::POST, "/v1/movies", Some(payload), &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let payload = json!({"title": "Moana", "year": 2016, "runtime": "107 mins"});
    let (status, body) = call(&app, Method::POST, "/v1/movies", Some(payload), &[]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!({"genres": "must be provided"}));

    let payload = json!({"title": "Moana", "year": 2016, "runtime": "107 mins", "genres": []});
    let (status, body) = call(&app, Method::POST, "/v1/movies", Some(payload), &[]).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["genres"], "must contain at least 1 genre");

    let movie = create_movie(&app, "Moana", 2016, &["animation"]).await;
    let url = format!("/v1/movies/{}", movie["id"]);
    let (status, body) = call(
        &app,
        Method::PATCH,
        &url,
        Some(json!({"genres": []})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["genres"], "must contain at least 1 genre");
}

#[tokio::test]
#[traced_test]
async fn test_list_movies() {
    let app = test_app().await;
    create_movie(&app, "Casablanca", 1942, &["drama", "romance"]).await;
    create_movie(&app, "Black Panther", 2018, &["action", "adventure"]).await;
    create_movie(&app, "The Black Stallion", 1979, &["adventure", "drama"]).await;
    create_movie(&app, "Deadpool", 2016, &["action", "comedy"]).await;

    let (status, body) = call(&app, Method::GET, "/v1/movies", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"].as_array().unwrap().len(), 4);
    assert_eq!(body["metadata"]["total_records"], 4);
    assert_eq!(body["metadata"]["page_size"], 20);

    let (status, body) = call(
        &app,
        Method::GET,
        "/v1/movies?title=black&genres=adventure,drama&sort=-year",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["title"], "The Black Stallion");

    let (status, body) = call(
        &app,
        Method::GET,
        "/v1/movies?page=2&page_size=3&sort=-year",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["title"], "Casablanca");
    assert_eq!(body["metadata"]["current_page"], 2);
    assert_eq!(body["metadata"]["last_page"], 2);

    let (status, body) = call(
        &app,
        Method::GET,
        "/v1/movies?sort=created_at&page_size=101",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["sort"], "invalid sort value");
    assert!(body["error"]["page_size"].is_string());

    let (status, _) = call(&app, Method::GET, "/v1/movies?page=abc", None, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[traced_test]
async fn test_malformed_id() {
    let app = test_app().await;
    for method in [Method::GET, Method::DELETE] {
        let (status, body) = call(&app, method, "/v1/movies/abc", None, &[]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/v1/movies/abc",
        Some(json!({"title": "Moana"})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
