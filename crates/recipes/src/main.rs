//! Recipes.
//!
//! A small client for the recipes API: it fetches the recipe list and loads
//! the referenced images through a shared in-memory image cache, so an image
//! is downloaded at most once per session.

mod cli;
mod logging;

fn main() {
    match cli::execute() {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            logging::ensure_log_error(&error);
            std::process::exit(1);
        }
    }
}
