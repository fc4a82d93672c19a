//! Tests for the recipe list client against a local HTTP server.

use recipes_service::config::Config;
use recipes_service::recipes::{NetworkError, RecipeList, RecipeListState, RecipeService};
use recipes_test as test;

fn service(url: &str) -> RecipeService {
    let config = Config {
        recipes_url: url.to_owned(),
        ..Config::default()
    };
    RecipeService::new(&config).expect("the test url must parse")
}

#[tokio::test]
async fn test_fetch_recipes() {
    test::setup();
    let server = test::Server::new();

    let recipes = service(server.url("/recipes.json").as_str())
        .fetch_recipes()
        .await
        .unwrap();

    assert_eq!(recipes.len(), 3);
    assert_eq!(recipes[0].name, "Apam Balik");
    assert_eq!(recipes[0].cuisine, "Malaysian");
    assert_eq!(
        recipes[0].photo_url(),
        Some("https://some.url/photos/apam-balik/large.jpg")
    );
    // The last fixture recipe has no photos at all.
    assert_eq!(recipes[2].photo_url(), None);
}

#[tokio::test]
async fn test_fetch_recipes_invalid_url() {
    test::setup();

    let config = Config {
        recipes_url: "not a url".to_owned(),
        ..Config::default()
    };

    assert!(matches!(
        RecipeService::new(&config),
        Err(NetworkError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn test_fetch_recipes_bad_status() {
    test::setup();
    let server = test::Server::new();

    let result = service(server.url("/respond_statuscode/404/recipes.json").as_str())
        .fetch_recipes()
        .await;

    assert!(matches!(result, Err(NetworkError::BadStatus(404))));
}

#[tokio::test]
async fn test_fetch_recipes_decoding_error() {
    test::setup();
    let server = test::Server::new();

    let result = service(server.url("/recipes-malformed.json").as_str())
        .fetch_recipes()
        .await;

    assert!(matches!(result, Err(NetworkError::Decoding(_))));
}

#[tokio::test]
async fn test_fetch_recipes_unreachable_server() {
    test::setup();

    // Nothing listens on port 1.
    let result = service("http://127.0.0.1:1/recipes.json")
        .fetch_recipes()
        .await;

    assert!(matches!(result, Err(NetworkError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_recipe_list_loads() {
    test::setup();
    let server = test::Server::new();

    let list = RecipeList::new(service(server.url("/recipes.json").as_str()));
    assert!(matches!(list.state(), RecipeListState::Idle));

    let state = list.load().await;

    match state {
        RecipeListState::Loaded(recipes) => assert_eq!(recipes.len(), 3),
        state => panic!("expected a loaded list, got {state:?}"),
    }
}

#[tokio::test]
async fn test_recipe_list_empty() {
    test::setup();
    let server = test::Server::new();

    let list = RecipeList::new(service(server.url("/recipes-empty.json").as_str()));
    let state = list.load().await;

    assert!(matches!(state, RecipeListState::Empty));
}

#[tokio::test]
async fn test_recipe_list_failed() {
    test::setup();
    let server = test::Server::new();

    let list = RecipeList::new(service(
        server.url("/respond_statuscode/500/recipes.json").as_str(),
    ));
    let state = list.load().await;

    match state {
        RecipeListState::Failed(error) => {
            assert!(matches!(*error, NetworkError::BadStatus(500)))
        }
        state => panic!("expected a failed list, got {state:?}"),
    }
}

#[tokio::test]
async fn test_recipe_list_publishes_transitions() {
    test::setup();
    let server = test::Server::new();

    let list = RecipeList::new(service(server.url("/recipes.json").as_str()));
    let mut rx = list.subscribe();

    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            let done = !matches!(state, RecipeListState::Loading);
            seen.push(state);
            if done {
                break;
            }
        }
        seen
    });

    list.load().await;
    let states = watcher.await.unwrap();

    assert_eq!(states.len(), 2, "expected loading then loaded: {states:?}");
    assert!(matches!(states[0], RecipeListState::Loading));
    assert!(matches!(states[1], RecipeListState::Loaded(_)));
}
