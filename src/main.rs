mod clipboard;
mod config;
mod context;
mod database;
mod display;
mod errors;
mod firestore;
mod http_client;
mod import;
mod models;
mod render;
mod store;
mod view;
mod widgets;

use anyhow::{Context, Result};
use clap::Parser;
use clipboard::MemoryClipboard;
use config::{Config, StoreBackend};
use context::{AuthSnapshot, ListingRoute};
use firestore::FirestoreStore;
use store::{DocumentStore, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use view::{ListingView, LoadPhase, ViewOptions};

#[derive(Parser, Debug)]
#[command(name = "listing-view")]
#[command(about = "Render a real-estate listing page from the document store", long_about = None)]
struct Args {
    /// Listing document id to render
    #[arg(long)]
    listing_id: Option<String>,

    /// Category segment of the page address (rent or sale)
    #[arg(long, default_value = "rent")]
    category: String,

    /// Id of the signed-in user; omit to render for a signed-out visitor
    #[arg(long)]
    uid: Option<String>,

    /// Click the share icon before rendering
    #[arg(long)]
    copy_link: bool,

    /// Click the active slide before rendering
    #[arg(long)]
    toggle_slider: bool,

    /// Save the rendered HTML to a file instead of printing it
    #[arg(long)]
    save_html: Option<String>,

    /// Move the carousel to this slide before rendering
    #[arg(long)]
    slide: Option<usize>,

    /// Import listings from a JSON export into the local store
    #[arg(long)]
    import: Option<String>,

    /// Remove a listing from the local store
    #[arg(long)]
    delete: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            if !std::path::Path::new("data/config.yaml").exists() {
                eprintln!("Creating default data/config.yaml");
                Config::create_default()?;
            }
            return Ok(());
        }
    };

    // Initialize logging - use RUST_LOG env var if set, otherwise use config
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
        tracing::info!("Logging level set from RUST_LOG environment variable");
    } else {
        let level = config.tracing_level.to_lowercase();
        let max_level = match level.as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                eprintln!("Invalid tracing level '{}', using 'info'", level);
                tracing::Level::INFO
            }
        };

        tracing_subscriber::fmt()
            .with_max_level(max_level)
            .with_writer(std::io::stderr)
            .init();

        tracing::debug!("Logging level set to: {} (from data/config.yaml)", level);
    }

    if let Some(path) = args.import {
        return import_file(&path, &config);
    }

    if let Some(id) = args.delete {
        return delete_listing(&id, &config);
    }

    let Some(listing_id) = args.listing_id else {
        eprintln!("Nothing to do: pass --listing-id <ID> to render a page, --import <FILE> to seed the store or --delete <ID> to remove a listing");
        return Ok(());
    };

    let store = open_store(&config)?;
    tracing::info!("Using {} document store", store.name());

    let clipboard = Arc::new(MemoryClipboard::new());
    let auth = match &args.uid {
        Some(uid) => AuthSnapshot::signed_in(uid),
        None => AuthSnapshot::anonymous(),
    };
    let route = ListingRoute::new(&config.base_url, &args.category, &listing_id);
    let options = ViewOptions {
        share_reset: Duration::from_millis(config.share_reset_ms),
        map_zoom: config.map_zoom,
    };

    let view = ListingView::new(store, clipboard.clone(), auth, route, options);
    view.mount().await;

    let state = view.snapshot().await;
    match &state.phase {
        LoadPhase::Found(listing) => tracing::info!("Loaded listing '{}'", listing.name),
        LoadPhase::NotFound => tracing::warn!("Listing {} not found", listing_id),
        LoadPhase::Error(reason) => tracing::error!("Failed to load listing {}: {}", listing_id, reason),
        LoadPhase::Loading => {}
    }

    if state.phase.listing().is_some() {
        if let Some(index) = args.slide {
            view.slide_changed(index).await;
        }
        if args.toggle_slider {
            view.toggle_slider().await;
        }
        if args.copy_link {
            view.copy_share_link().await?;
            if let Some(copied) = clipboard.contents().await {
                eprintln!("Link copied: {}", copied);
            }
        }
    }

    let page = view.render().await.into_string();

    if let Some(path) = args.save_html {
        std::fs::write(&path, &page)
            .with_context(|| format!("Failed to write HTML to {}", path))?;
        tracing::info!("HTML saved to: {}", path);
    } else {
        println!("{}", page);
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Sqlite => {
            if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            Arc::new(SqliteStore::open(&config.database_path)?)
        }
        StoreBackend::Firestore => Arc::new(FirestoreStore::with_endpoint(
            &config.firestore_endpoint,
            &config.firestore_project_id,
            config.firestore_api_key.clone(),
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )?),
    };
    Ok(store)
}

/// Seed the local SQLite store from a JSON export
fn import_file(path: &str, config: &Config) -> Result<()> {
    if config.store_backend != StoreBackend::Sqlite {
        anyhow::bail!("Import only writes to the sqlite backend");
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path))?;
    let export: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path))?;

    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = database::Database::new(&config.database_path)?;
    let ids = import::import_listings(&db, export)?;

    for id in &ids {
        println!("{}", id);
    }
    eprintln!(
        "Imported {} listings into {} ({} stored)",
        ids.len(),
        config.database_path,
        db.count_documents(models::LISTINGS_COLLECTION)?
    );

    Ok(())
}

/// Remove one listing from the local SQLite store
fn delete_listing(id: &str, config: &Config) -> Result<()> {
    if config.store_backend != StoreBackend::Sqlite {
        anyhow::bail!("Delete only works on the sqlite backend");
    }

    let db = database::Database::new(&config.database_path)?;
    if db.delete_document(models::LISTINGS_COLLECTION, id)? {
        tracing::info!("Deleted listing {}", id);
    } else {
        tracing::warn!("No listing {} to delete", id);
    }

    Ok(())
}
