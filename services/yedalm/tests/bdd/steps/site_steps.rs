//! BDD step definitions for data API and site lifecycle features

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use yedalm::admin::AdminConsole;
use yedalm::config::Config;
use yedalm::io::{HttpClient, HttpResponse};
use yedalm::store::PostgrestStore;

use super::{parse_ids, parse_pairs};
use crate::world::{RunningSite, YedalmWorld};

const BASE: &str = "https://demo.supabase.co";

// --- Test doubles ---

/// A recorded HTTP request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

/// An HTTP client that records all requests and serves canned slide rows
#[derive(Debug, Default)]
pub struct RecordingHttpClient {
    pub slides: serde_json::Value,
    pub requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl RecordingHttpClient {
    async fn record(&self, method: &str, url: &str, body: Option<&serde_json::Value>) {
        self.requests.write().await.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body: body.cloned(),
        });
    }

    fn ok(body: String) -> yedalm::Result<HttpResponse> {
        Ok(HttpResponse { status: 200, body })
    }
}

#[async_trait::async_trait]
impl HttpClient for RecordingHttpClient {
    async fn get(&self, url: &str) -> yedalm::Result<HttpResponse> {
        self.record("GET", url, None).await;
        if url.contains("/rest/v1/slide_images") {
            Self::ok(self.slides.to_string())
        } else {
            Self::ok("[]".to_string())
        }
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> yedalm::Result<HttpResponse> {
        self.record("POST", url, Some(body)).await;
        Self::ok(format!("[{}]", body))
    }

    async fn patch_json(&self, url: &str, body: &serde_json::Value) -> yedalm::Result<HttpResponse> {
        self.record("PATCH", url, Some(body)).await;
        Self::ok(format!("[{}]", body))
    }

    async fn delete(&self, url: &str) -> yedalm::Result<HttpResponse> {
        self.record("DELETE", url, None).await;
        Self::ok(String::new())
    }
}

// --- Data API ---

#[given(expr = "a data API holding slides {string}")]
fn data_api_with_slides(world: &mut YedalmWorld, list: String) {
    let slides: Vec<serde_json::Value> = parse_ids(&list)
        .into_iter()
        .enumerate()
        .map(|(i, id)| {
            serde_json::json!({
                "id": id,
                "title": format!("Slide {}", id),
                "image_url": "",
                "order_index": i + 1,
                "is_active": true
            })
        })
        .collect();
    world.http = Some(Arc::new(RecordingHttpClient {
        slides: serde_json::Value::Array(slides),
        ..Default::default()
    }));
}

#[given("an admin console connected to the data API")]
async fn console_on_data_api(world: &mut YedalmWorld) {
    let http: Arc<dyn HttpClient> = world.http.clone().expect("data API not set");
    let store = PostgrestStore::new(BASE, http);
    let console = AdminConsole::new(Arc::new(store));
    console.load().await;
    world.console = Some(Arc::new(console));
}

#[then("every list request asked for active rows by position")]
async fn list_requests_filtered(world: &mut YedalmWorld) {
    let http = world.http.as_ref().expect("data API not set");
    let requests = http.requests.read().await;
    let slide_gets: Vec<&RecordedRequest> = requests
        .iter()
        .filter(|r| r.method == "GET" && r.url.contains("/slide_images"))
        .collect();
    assert_eq!(slide_gets.len(), 1);
    assert!(slide_gets[0].url.contains("is_active=eq.true"));
    assert!(slide_gets[0].url.contains("order=order_index.asc"));
}

#[then(expr = "the data API received order patches {string}")]
async fn order_patches(world: &mut YedalmWorld, pairs: String) {
    let http = world.http.as_ref().expect("data API not set");
    let requests = http.requests.read().await;
    let patches: Vec<&RecordedRequest> = requests.iter().filter(|r| r.method == "PATCH").collect();
    let expected = parse_pairs(&pairs);
    assert_eq!(patches.len(), expected.len());

    for (request, (id, order_index)) in patches.iter().zip(expected) {
        assert_eq!(
            request.url,
            format!("{}/rest/v1/slide_images?id=eq.{}", BASE, id)
        );
        assert_eq!(
            request.body,
            Some(serde_json::json!({ "order_index": order_index }))
        );
    }
}

// --- Site lifecycle ---

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("no free port")
}

#[given("a site running on the in-memory store")]
async fn site_running(world: &mut YedalmWorld) {
    let mut config = Config::default();
    config.site.bind = "127.0.0.1".to_string();
    config.site.port = free_port();
    let base_url = format!("http://127.0.0.1:{}", config.site.port);

    let store = yedalm::build_store(&config.backend).expect("store");
    let cancel = CancellationToken::new();
    let task = tokio::spawn(yedalm::serve(config, store, cancel.clone()));

    for _ in 0..100 {
        if reqwest::get(format!("{}/health", base_url)).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    world.site = Some(RunningSite {
        base_url,
        cancel,
        task: Some(task),
    });
}

#[when(expr = "{string} is requested from the site")]
async fn request_path(world: &mut YedalmWorld, path: String) {
    let site = world.site.as_ref().expect("site not running");
    let response = reqwest::get(format!("{}{}", site.base_url, path))
        .await
        .expect("request failed");
    let status = response.status().as_u16();
    let body = response.text().await.expect("body");
    world.last_response = Some((status, body));
}

#[then(expr = "the site answers {int}")]
fn site_answers(world: &mut YedalmWorld, status: u16) {
    let (actual, _) = world.last_response.as_ref().expect("no response");
    assert_eq!(*actual, status);
}

#[then(expr = "the response contains {string}")]
fn response_contains(world: &mut YedalmWorld, text: String) {
    let (_, body) = world.last_response.as_ref().expect("no response");
    assert!(body.contains(&text), "body was: {}", body);
}

#[when("the site is cancelled")]
fn cancel_site(world: &mut YedalmWorld) {
    world.site.as_ref().expect("site not running").cancel.cancel();
}

#[then("the site stops")]
async fn site_stops(world: &mut YedalmWorld) {
    let task = world
        .site
        .as_mut()
        .and_then(|s| s.task.take())
        .expect("site not running");
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("site did not stop")
        .expect("site task panicked");
    assert!(result.is_ok(), "site failed: {:?}", result);
}
