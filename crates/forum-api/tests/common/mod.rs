use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use forum_api::{
    config::{ApiConfig, Environment},
    middleware::{request_id::request_id_middleware, security_headers::apply_security_headers},
    router,
    state::ApiState,
};
use forum_db::{
    MemoryTopicStore, StoreError, StoreResult, TopicStore, TopicTransaction,
    models::{Course, NewTopic, Topic, TopicChanges, TopicWithCourse},
    page::{Page, PageRequest},
};
use http_body_util::BodyExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Topic store that counts how often listings reach it and can be told to
/// fail every write
#[derive(Debug, Clone, Default)]
pub struct CountingStore {
    inner: MemoryTopicStore,
    page_queries: Arc<AtomicUsize>,
    failing_writes: Arc<AtomicBool>,
}

impl CountingStore {
    pub fn new(inner: MemoryTopicStore) -> Self {
        Self {
            inner,
            page_queries: Arc::default(),
            failing_writes: Arc::default(),
        }
    }

    pub fn page_queries(&self) -> usize {
        self.page_queries.load(Ordering::SeqCst)
    }

    /// From now on every insert, update and delete fails like a lost database
    pub fn fail_writes(&self) {
        self.failing_writes.store(true, Ordering::SeqCst);
    }

    pub async fn topic_count(&self) -> usize {
        self.inner.topic_count().await
    }
}

#[async_trait]
impl TopicStore for CountingStore {
    async fn find_page(
        &self,
        course_name: Option<&str>,
        request: &PageRequest,
    ) -> StoreResult<Page<TopicWithCourse>> {
        self.page_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.find_page(course_name, request).await
    }

    async fn find_topic(&self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>> {
        self.inner.find_topic(topic_id).await
    }

    async fn find_course(&self, course_id: i64) -> StoreResult<Option<Course>> {
        self.inner.find_course(course_id).await
    }

    async fn begin(&self) -> StoreResult<Box<dyn TopicTransaction>> {
        let tx = self.inner.begin().await?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Ok(Box::new(FailingTransaction { inner: tx }));
        }
        Ok(tx)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

/// Reads pass through; every write errors out
struct FailingTransaction {
    inner: Box<dyn TopicTransaction>,
}

fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl TopicTransaction for FailingTransaction {
    async fn find_course(&mut self, course_id: i64) -> StoreResult<Option<Course>> {
        self.inner.find_course(course_id).await
    }

    async fn find_topic(&mut self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>> {
        self.inner.find_topic(topic_id).await
    }

    async fn insert_topic(&mut self, _topic: NewTopic) -> StoreResult<Topic> {
        Err(unavailable())
    }

    async fn update_topic(
        &mut self,
        _topic_id: i64,
        _changes: &TopicChanges,
    ) -> StoreResult<Option<Topic>> {
        Err(unavailable())
    }

    async fn delete_topic(&mut self, _topic_id: i64) -> StoreResult<bool> {
        Err(unavailable())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.inner.commit().await
    }
}

/// Test state builder backed by the in-memory store
pub struct TestStateBuilder {
    config: ApiConfig,
    courses: Vec<Course>,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            config: ApiConfig::default(),
            courses: vec![
                course(1, "Spring Boot", "Programação"),
                course(2, "HTML 5", "Front-end"),
            ],
        }
    }

    pub fn environment(mut self, env: Environment) -> Self {
        self.config.env = env;
        self
    }

    /// Build the state and hand back the store for direct inspection
    pub fn build(self) -> (ApiState, CountingStore) {
        let store = CountingStore::new(MemoryTopicStore::with_courses(self.courses));
        let state = ApiState::new(&self.config, Arc::new(store.clone()));
        (state, store)
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn course(id: i64, name: &str, category: &str) -> Course {
    Course {
        id,
        name: name.to_string(),
        category: category.to_string(),
    }
}

/// Full application router with the same middleware stack as the server
pub fn app(state: ApiState) -> Router {
    let environment = state.environment;
    let router = router::router()
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware));
    apply_security_headers(router, environment)
}

/// Client and store over a freshly seeded application
pub fn test_app() -> (TestClient, CountingStore) {
    let (state, store) = TestStateBuilder::new().build();
    (TestClient::new(app(state)), store)
}

/// Helper to make requests to the test app
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Send a request and get the response
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            body: body_bytes.to_vec(),
            headers,
        }
    }

    /// Send a request without a body
    pub async fn send(&self, method: &str, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send("DELETE", uri).await
    }

    /// Send a request with a raw JSON body
    pub async fn send_raw_json(&self, method: &str, uri: &str, body: String) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("Failed to build request");

        self.request(request).await
    }

    pub async fn post_json<T: serde::Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body");
        self.send_raw_json("POST", uri, json_body).await
    }

    pub async fn put_json<T: serde::Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body");
        self.send_raw_json("PUT", uri, json_body).await
    }

    /// Create a topic and return its summary
    pub async fn create_topic(&self, title: &str, message: &str, course_id: i64) -> Value {
        let response = self
            .post_json(
                "/topicos",
                &json!({
                    "title": title,
                    "message": message,
                    "courseId": course_id,
                }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    /// Ids of a listing page, in order
    pub async fn list_ids(&self, uri: &str) -> Vec<i64> {
        let response = self.get(uri).await;
        response.assert_status(StatusCode::OK);
        let page: Value = response.json();

        page["content"]
            .as_array()
            .expect("content should be an array")
            .iter()
            .map(|topic| topic["id"].as_i64().expect("id should be a number"))
            .collect()
    }
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub headers: axum::http::HeaderMap,
}

impl TestResponse {
    /// Get response body as string
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not valid UTF-8")
    }

    /// Parse response body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
