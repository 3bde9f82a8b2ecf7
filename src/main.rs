//! Libris console - smoke flow against a running library API
//!
//! Stands in for the view layer: dispatches the same actions a UI would and
//! prints what the slices settle to.

use std::env;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_client::guard::{evaluate, Access, Requirement};
use libris_client::models::user::Credentials;
use libris_client::policy;
use libris_client::{AppConfig, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libris_client={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Libris client v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("API base URL: {}", config.api.base_url);

    let store = Store::from_config(&config).expect("Failed to build client store");

    if let (Ok(username), Ok(password)) = (env::var("LIBRIS_USERNAME"), env::var("LIBRIS_PASSWORD"))
    {
        let credentials = Credentials { username, password };
        if let Err(e) = store.session.login(&credentials).await {
            if let Some(route) = policy::error_route(&e) {
                tracing::error!("Login failed, view would navigate to {}", route);
            }
            anyhow::bail!("Login failed: {}", e);
        }
        tracing::info!("Logged in as {}", credentials.username);

        store.session.fetch_current_user().await?;
        let session = store.session.state().await;
        if let Some(user) = &session.user {
            tracing::info!("Current user: {} ({})", user.username, user.role);
        }

        let snapshot = store.session.snapshot().await;
        match evaluate(&snapshot, Requirement::LibrarianOrAdmin) {
            Access::Allow => {
                store.borrows.fetch_all().await?;
                let borrows = store.borrows.state().await;
                tracing::info!("{} borrow records on file", borrows.records.len());
            }
            Access::Denied(reason) => tracing::info!("Skipping borrow records: {}", reason),
            Access::RedirectToLogin => unreachable!("just logged in"),
        }
    } else {
        tracing::warn!("LIBRIS_USERNAME/LIBRIS_PASSWORD not set, browsing anonymously");
    }

    store.books.fetch_all().await?;
    store.categories.fetch_all().await?;

    let books = store.books.state().await;
    let categories = store.categories.state().await;
    tracing::info!(
        "Catalog: {} books across {} categories",
        books.books.len(),
        categories.categories.len()
    );
    for book in books.books.iter().take(10) {
        tracing::info!("  [{}] {} - {} ({})", book.id, book.title, book.author, book.status);
    }

    Ok(())
}
