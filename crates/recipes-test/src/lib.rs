//! Helpers for testing the recipes services.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all
//!    console output is captured by the test runner.
//!
//!  - When using [`Server`], make sure that the server is held until all
//!    requests to it have been made. If the server is dropped, the ports
//!    remain open and all connections to it will time out. To avoid this,
//!    assign it to a variable: `let server = test::Server::new();`.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{OriginalUri, Path, Request};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::routing::get;
use axum::{Json, Router};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;
use url::Url;

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from the crates under
///    test and mutes all other logs (such as hyper or the image codecs).
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new("recipes_service=trace,recipes=trace"))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// A small but valid PNG payload.
///
/// Generated on the fly instead of checked in, so the bytes are guaranteed
/// to match what the decoder under test expects. 4x4 pixels, solid red.
pub fn png_fixture() -> Vec<u8> {
    let pixels = image::RgbaImage::from_pixel(4, 4, image::Rgba([0xf4, 0x43, 0x36, 0xff]));

    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encoding the fixture image cannot fail");

    bytes.into_inner()
}

/// The canned recipe list served under `/recipes.json`.
pub fn recipes_fixture() -> serde_json::Value {
    serde_json::json!({
        "recipes": [
            {
                "cuisine": "Malaysian",
                "name": "Apam Balik",
                "photo_url_large": "https://some.url/photos/apam-balik/large.jpg",
                "photo_url_small": "https://some.url/photos/apam-balik/small.jpg",
                "uuid": "0c6ca6e7-e32a-4053-b824-1dbf749910d8",
                "source_url": "https://www.nyonyacooking.com/recipes/apam-balik~SJ5WuvsDf9WQ",
                "youtube_url": "https://www.youtube.com/watch?v=6R8ffRRJcrg"
            },
            {
                "cuisine": "British",
                "name": "Apple & Blackberry Crumble",
                "photo_url_large": "https://some.url/photos/crumble/large.jpg",
                "photo_url_small": "https://some.url/photos/crumble/small.jpg",
                "uuid": "599344f4-3c5c-4cca-b914-2210e3b3312f",
                "source_url": "https://www.bbcgoodfood.com/recipes/778642/apple-and-blackberry-crumble",
                "youtube_url": "https://www.youtube.com/watch?v=4vhcOwVBDO4"
            },
            {
                "cuisine": "British",
                "name": "Bakewell Tart",
                "uuid": "eed6005f-f8c8-451f-98d0-4088e2b40eb6"
            }
        ]
    })
}

/// A test server that binds to a random port and serves the fixture app.
///
/// Every request is counted per URI; [`accesses`](Self::accesses) drains the
/// counter, which is how tests assert that a code path did (or did not)
/// touch the network. The server requires a `tokio` runtime and is supposed
/// to be run in a `tokio::test`. It automatically stops serving when
/// dropped.
///
/// Routes:
///
///  - `/images/*name` — the [`png_fixture`] payload, for any name
///  - `/garbage_data/*tail` — echoes `tail`, which never decodes as an image
///  - `/respond_statuscode/:num/*tail` — an empty response with that status
///  - `/redirect/*path` — `302` to `/{path}`
///  - `/recipes.json`, `/recipes-empty.json`, `/recipes-malformed.json` —
///    the recipe list fixtures
#[derive(Debug)]
pub struct Server {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    hits: Arc<Mutex<BTreeMap<String, usize>>>,
}

impl Server {
    /// Spawns the test server on an ephemeral localhost port.
    pub fn new() -> Self {
        let hits = Arc::new(Mutex::new(BTreeMap::new()));

        let hitcounter = {
            let hits = Arc::clone(&hits);
            move |OriginalUri(uri): OriginalUri, request: Request, next: Next| {
                let hits = Arc::clone(&hits);
                async move {
                    {
                        let mut hits = hits.lock().unwrap();
                        let hits = hits.entry(uri.to_string()).or_default();
                        *hits += 1;
                    }

                    next.run(request).await
                }
            }
        };

        let router = Router::new()
            .route(
                "/images/*name",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], png_fixture()) }),
            )
            .route(
                "/garbage_data/*tail",
                get(|Path(tail): Path<String>| async move { tail }),
            )
            .route(
                "/respond_statuscode/:num/*tail",
                get(
                    |Path((num, _)): Path<(u16, String)>| async move {
                        StatusCode::from_u16(num).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                    },
                ),
            )
            .route(
                "/redirect/*path",
                get(|Path(path): Path<String>| async move {
                    (StatusCode::FOUND, [(header::LOCATION, format!("/{path}"))])
                }),
            )
            .route("/recipes.json", get(|| async { Json(recipes_fixture()) }))
            .route(
                "/recipes-empty.json",
                get(|| async { Json(serde_json::json!({ "recipes": [] })) }),
            )
            .route(
                "/recipes-malformed.json",
                get(|| async { "certainly not a recipe list" }),
            )
            .layer(middleware::from_fn(hitcounter));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();
        let listener = tokio::net::TcpListener::from_std(listener).unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            handle,
            socket,
            hits,
        }
    }

    /// Returns the socket address that this server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.socket
    }

    /// Returns the port that this server listens on.
    pub fn port(&self) -> u16 {
        self.addr().port()
    }

    /// Returns a full URL pointing to the given path.
    pub fn url(&self, path: &str) -> Url {
        let path = path.trim_start_matches('/');
        format!("http://127.0.0.1:{}/{}", self.port(), path)
            .parse()
            .unwrap()
    }

    /// Returns the total number of requests served so far, and resets the
    /// counter.
    pub fn accesses(&self) -> usize {
        let map = std::mem::take(&mut *self.hits.lock().unwrap());
        map.into_values().sum()
    }

    /// Returns the number of requests served per URI, and resets the
    /// counter.
    pub fn all_hits(&self) -> Vec<(String, usize)> {
        let map = std::mem::take(&mut *self.hits.lock().unwrap());
        map.into_iter().collect()
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
