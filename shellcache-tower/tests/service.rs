//! The worker as Tower middleware in front of a scripted network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::header::HeaderName;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use shellcache::{Origin, Worker, WorkerConfig};
use shellcache_core::BoxError;
use shellcache_memory::MemoryStorage;
use shellcache_tower::{ServiceWorkerLayer, TowerUpstream};
use tower::{Layer, Service, ServiceExt};

#[derive(Clone, Default)]
struct Network {
    calls: Arc<Mutex<Vec<String>>>,
    offline: Arc<AtomicBool>,
}

impl Network {
    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }

    /// Answers every path with its own name; `POST` bodies are echoed back.
    fn service(
        &self,
    ) -> impl Service<
        Request<Full<Bytes>>,
        Response = Response<Full<Bytes>>,
        Error = BoxError,
        Future: Send,
    > + Clone
    + Send
    + 'static {
        let network = self.clone();
        tower::service_fn(move |req: Request<Full<Bytes>>| {
            let network = network.clone();
            async move {
                network.calls.lock().unwrap().push(req.uri().path().to_owned());
                if network.offline.load(Ordering::SeqCst) {
                    return Err::<_, BoxError>("offline".into());
                }
                let body = if req.method() == Method::POST {
                    req.into_body().collect().await?.to_bytes()
                } else {
                    Bytes::from(req.uri().path().to_owned())
                };
                Ok(Response::new(Full::new(body)))
            }
        })
    }
}

fn worker() -> Worker<MemoryStorage> {
    let config = WorkerConfig::new(Origin::parse("https://leapmultix.org").unwrap());
    Worker::new(config, MemoryStorage::new()).unwrap()
}

async fn activated(network: &Network) -> Worker<MemoryStorage> {
    let worker = worker();
    let upstream = TowerUpstream::<_, Full<Bytes>, Full<Bytes>>::new(network.service());
    worker.on_install(upstream).await.unwrap();
    worker.on_activate().await.unwrap();
    worker
}

fn get(path: &str, dest: &str, mode: &str) -> Request<Full<Bytes>> {
    Request::get(path)
        .header("sec-fetch-dest", dest)
        .header("sec-fetch-mode", mode)
        .body(Full::default())
        .unwrap()
}

async fn body<B>(response: Response<B>) -> Bytes
where
    B: http_body::Body,
    B::Error: std::fmt::Debug,
{
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Test 1: before activation requests reach the inner service untouched
#[tokio::test]
async fn test_passthrough_before_activation() {
    let network = Network::default();
    let service = ServiceWorkerLayer::new(worker()).layer(network.service());

    let response = service
        .oneshot(get("/assets/icons/panda-192.png", "image", "no-cors"))
        .await
        .unwrap();

    assert!(response.headers().get("x-cache-status").is_none());
    assert_eq!(body(response).await, "/assets/icons/panda-192.png");
}

/// Test 2: images are fetched once and then served from the partition
#[tokio::test]
async fn test_image_cache_first() {
    let network = Network::default();
    let service = ServiceWorkerLayer::new(activated(&network).await).layer(network.service());

    let first = service
        .clone()
        .oneshot(get("/assets/images/star.png", "image", "no-cors"))
        .await
        .unwrap();
    assert_eq!(first.headers()["x-cache-status"], "MISS");

    let second = service
        .oneshot(get("/assets/images/star.png", "image", "no-cors"))
        .await
        .unwrap();
    assert_eq!(second.headers()["x-cache-status"], "HIT");
    assert_eq!(body(second).await, "/assets/images/star.png");
    assert_eq!(network.calls_to("/assets/images/star.png"), 1);
}

/// Test 3: an offline navigation is answered with the stored offline page
#[tokio::test]
async fn test_offline_navigation_serves_offline_page() {
    let network = Network::default();
    let service = ServiceWorkerLayer::new(activated(&network).await).layer(network.service());
    network.go_offline();

    let response = service
        .oneshot(get("/exercises/tables", "document", "navigate"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-cache-status"], "HIT");
    assert_eq!(body(response).await, "/offline.html");
}

/// Test 4: a failed fetch with nothing stored becomes the network-error response
#[tokio::test]
async fn test_offline_miss_is_network_error() {
    let network = Network::default();
    let service = ServiceWorkerLayer::new(activated(&network).await).layer(network.service());
    network.go_offline();

    let response = service
        .oneshot(get("/assets/icons/unknown.png", "image", "no-cors"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.headers()["x-cache-status"], "MISS");
    assert!(response.headers().contains_key("x-shellcache-error"));
}

/// Test 5: non-GET requests keep their body and are never stored
#[tokio::test]
async fn test_post_passes_through_with_body() {
    let network = Network::default();
    let service = ServiceWorkerLayer::new(activated(&network).await).layer(network.service());

    let request = Request::post("/api/scores")
        .body(Full::new(Bytes::from_static(b"{\"score\":12}")))
        .unwrap();
    let response = service.oneshot(request).await.unwrap();

    assert!(response.headers().get("x-cache-status").is_none());
    assert_eq!(body(response).await, "{\"score\":12}");
}

/// Test 6: a transport error on a pass-through request surfaces as the service error
#[tokio::test]
async fn test_passthrough_error_propagates() {
    let network = Network::default();
    let service = ServiceWorkerLayer::new(activated(&network).await).layer(network.service());
    network.go_offline();

    let request = Request::post("/api/scores").body(Full::default()).unwrap();

    assert!(service.oneshot(request).await.is_err());
}

/// Test 7: the status header name can be changed
#[tokio::test]
async fn test_custom_status_header() {
    let network = Network::default();
    let layer = ServiceWorkerLayer::new(activated(&network).await)
        .cache_status_header(HeaderName::from_static("x-shell"));
    let service = layer.layer(network.service());

    let response = service
        .oneshot(get("/js/main.js", "script", "no-cors"))
        .await
        .unwrap();

    assert_eq!(response.headers()["x-shell"], "MISS");
    assert!(response.headers().get("x-cache-status").is_none());
}
