//! Fetching and decoding the recipe list.
//!
//! The recipe list is a single HTTP GET returning `{ "recipes": [...] }`.
//! [`RecipeService`] performs that fetch with a closed error taxonomy, and
//! [`RecipeList`] drives the loading/loaded/empty/failed state a display
//! surface renders, with the same watch-channel mechanics as
//! [`ImageLoader`](crate::images::ImageLoader).

use std::sync::Arc;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use url::Url;
use uuid::Uuid;

use crate::config::Config;

/// An error fetching the recipe list.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The configured recipes endpoint is not a valid URL.
    #[error("invalid recipes url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The request never produced a usable response.
    #[error("invalid response from server: {0}")]
    InvalidResponse(#[from] reqwest::Error),
    /// The server responded with something other than `200 OK`.
    #[error("bad status code: {0}")]
    BadStatus(u16),
    /// The response body is not a valid recipe list.
    #[error("failed to decode response: {0}")]
    Decoding(#[source] serde_json::Error),
}

/// A single recipe, as served by the recipes API.
///
/// Field names match the snake_case wire format; `uuid` is the stable
/// identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub cuisine: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url_large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url_small: Option<String>,
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

impl Recipe {
    /// The locator of the photo to display, if the recipe has one.
    ///
    /// Prefers the large rendition, like the detail view does.
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url_large
            .as_deref()
            .or(self.photo_url_small.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct RecipeResponse {
    recipes: Vec<Recipe>,
}

/// Fetches the recipe list from the remote API.
#[derive(Debug, Clone)]
pub struct RecipeService {
    client: reqwest::Client,
    url: Url,
}

impl RecipeService {
    /// Creates a service fetching from the endpoint configured in `config`.
    pub fn new(config: &Config) -> Result<Self, NetworkError> {
        let url = Url::parse(&config.recipes_url)?;

        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }

    /// Fetches the recipe list.
    ///
    /// An empty list is a successful fetch; every failure mode maps onto
    /// one [`NetworkError`] variant.
    pub async fn fetch_recipes(&self) -> Result<Vec<Recipe>, NetworkError> {
        tracing::debug!(url = %self.url, "fetching recipes");

        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!(%status, "recipe fetch returned a bad status code");
            return Err(NetworkError::BadStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let response: RecipeResponse = serde_json::from_slice(&body).map_err(|err| {
            tracing::error!(error = %err, "failed to decode recipes");
            NetworkError::Decoding(err)
        })?;

        tracing::info!(count = response.recipes.len(), "fetched recipes");
        Ok(response.recipes)
    }
}

/// The lifecycle of the recipe list, as rendered by a display surface.
#[derive(Debug, Clone, Default)]
pub enum RecipeListState {
    /// No fetch has been started yet.
    #[default]
    Idle,
    /// The fetch is in flight.
    Loading,
    /// The list is available.
    Loaded(Vec<Recipe>),
    /// The fetch succeeded but returned no recipes.
    Empty,
    /// The fetch failed; a new `load` call retries.
    Failed(Arc<NetworkError>),
}

/// Drives [`RecipeListState`] through one fetch at a time.
#[derive(Debug)]
pub struct RecipeList {
    service: RecipeService,
    state: watch::Sender<RecipeListState>,
}

impl RecipeList {
    /// Creates an idle list backed by `service`.
    pub fn new(service: RecipeService) -> Self {
        Self {
            service,
            state: watch::Sender::new(RecipeListState::Idle),
        }
    }

    /// The current state.
    pub fn state(&self) -> RecipeListState {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<RecipeListState> {
        self.state.subscribe()
    }

    /// Fetches the recipe list and returns the state it ended in.
    pub async fn load(&self) -> RecipeListState {
        self.transition(RecipeListState::Loading);

        match self.service.fetch_recipes().await {
            Ok(recipes) if recipes.is_empty() => {
                tracing::warn!("recipe fetch completed but no recipes were found");
                self.transition(RecipeListState::Empty)
            }
            Ok(recipes) => self.transition(RecipeListState::Loaded(recipes)),
            Err(err) => {
                tracing::error!(error = %err, "failed to load recipes");
                self.transition(RecipeListState::Failed(Arc::new(err)))
            }
        }
    }

    fn transition(&self, next: RecipeListState) -> RecipeListState {
        self.state.send_replace(next.clone());
        next
    }
}
