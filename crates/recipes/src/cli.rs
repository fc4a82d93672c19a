//! Exposes the command line application.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use recipes_service::caching::ImageCache;
use recipes_service::config::Config;
use recipes_service::download::Downloader;
use recipes_service::images::{ImageLoader, LoadState};
use recipes_service::recipes::{Recipe, RecipeList, RecipeListState, RecipeService};

use crate::logging;

/// Recipes commands.
#[derive(Subcommand)]
enum Command {
    /// Fetch and print the recipe list.
    List,
    /// Fetch the recipe list and load every referenced image into the cache.
    Prefetch,
}

/// Command line interface parser.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Path to your configuration file.
    #[arg(long = "config", short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Returns the path to the configuration file.
    fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// Runs the main application.
pub fn execute() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::get(cli.config()).context("failed loading config")?;

    logging::init(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create the runtime")?;

    match cli.command {
        Command::List => runtime.block_on(list(&config)),
        Command::Prefetch => runtime.block_on(prefetch(&config)),
    }
}

/// Fetches the recipe list, mapping the terminal states back to a result.
async fn fetch_recipes(config: &Config) -> Result<Vec<Recipe>> {
    let list = RecipeList::new(RecipeService::new(config)?);

    match list.load().await {
        RecipeListState::Loaded(recipes) => Ok(recipes),
        RecipeListState::Empty => Ok(Vec::new()),
        RecipeListState::Failed(error) => anyhow::bail!("failed to fetch recipes: {error}"),
        state => anyhow::bail!("recipe list did not finish loading: {state:?}"),
    }
}

async fn list(config: &Config) -> Result<()> {
    let recipes = fetch_recipes(config).await?;
    if recipes.is_empty() {
        println!("no recipes available");
        return Ok(());
    }

    for recipe in recipes {
        println!("{:<12} {} ({})", recipe.cuisine, recipe.name, recipe.uuid);
    }

    Ok(())
}

async fn prefetch(config: &Config) -> Result<()> {
    let recipes = fetch_recipes(config).await?;

    let cache = ImageCache::new();
    let downloader = Arc::new(Downloader::new(config));

    let loads = recipes
        .iter()
        .filter_map(|recipe| recipe.photo_url())
        .map(|locator| {
            let loader = ImageLoader::new(locator, cache.clone(), Arc::clone(&downloader));
            async move { loader.load().await }
        });

    let mut loaded = 0usize;
    let mut failed = 0usize;
    for state in futures::future::join_all(loads).await {
        match state {
            LoadState::Loaded(image) => {
                tracing::debug!(
                    width = image.width(),
                    height = image.height(),
                    bytes = image.byte_size(),
                    "image cached"
                );
                loaded += 1;
            }
            LoadState::Failed(error) => {
                tracing::warn!(error = %error, "image failed to load");
                failed += 1;
            }
            _ => {}
        }
    }

    println!("cached {loaded} images, {failed} failed");
    Ok(())
}
