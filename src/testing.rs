//! Local stand-ins for the translation and inference services.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION};
use axum::routing::any;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// A request as seen by a [`ScriptedEndpoint`].
#[derive(Clone, Debug)]
pub(crate) struct RecordedRequest {
    pub(crate) query: Option<String>,
    pub(crate) authorization: Option<String>,
    pub(crate) body: Bytes,
}

/// Replies with the scripted responses in order, repeating the last one.
pub(crate) struct ScriptedEndpoint {
    pub(crate) url: url::Url,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedEndpoint {
    pub(crate) async fn start(responses: Vec<(StatusCode, Vec<u8>)>) -> Self {
        assert!(!responses.is_empty(), "script at least one response");
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responses = Arc::new(responses);

        let counter = hits.clone();
        let recorded = requests.clone();
        let router = Router::new().route(
            "/",
            any(move |uri: Uri, headers: HeaderMap, body: Bytes| {
                let counter = counter.clone();
                let recorded = recorded.clone();
                let responses = responses.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    recorded.lock().expect("lock requests").push(RecordedRequest {
                        query: uri.query().map(str::to_owned),
                        authorization: headers
                            .get(AUTHORIZATION)
                            .and_then(|value| value.to_str().ok())
                            .map(str::to_owned),
                        body,
                    });
                    let (status, body) = responses[attempt.min(responses.len() - 1)].clone();
                    (status, body)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            url: url::Url::parse(&format!("http://{addr}/")).expect("mock url"),
            hits,
            requests,
        }
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock requests").clone()
    }
}

/// A small but valid PNG.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Google Translate style body for a single translated segment.
pub(crate) fn translation_body(translated: &str, original: &str) -> Vec<u8> {
    serde_json::json!([[[translated, original, null, null, 10]], null, "es"])
        .to_string()
        .into_bytes()
}

/// Accepts connections and never answers, holding each socket open.
pub(crate) struct SilentEndpoint {
    pub(crate) url: url::Url,
    connections: Arc<AtomicUsize>,
}

impl SilentEndpoint {
    pub(crate) async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind silent listener");
        let addr = listener.local_addr().expect("silent address");
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });

        Self {
            url: url::Url::parse(&format!("http://{addr}/")).expect("silent url"),
            connections,
        }
    }

    pub(crate) fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}
