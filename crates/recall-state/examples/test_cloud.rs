//! Quick cloud connection check
//! Run with: cargo run --package recall-state --example test_cloud

use std::sync::Arc;

use recall_state::{CloudConfig, DocumentStore, SurrealDocumentStore, SurrealHandle};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    println!("Testing SurrealDB Cloud connection...");

    let config = match CloudConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Missing environment variables: {}", e);
            std::process::exit(1);
        }
    };
    println!("  Endpoint: {}", config.endpoint);
    println!("  Namespace: {}", config.namespace);
    println!("  Database: {}", config.database);
    println!("  User: {}", config.username);
    println!("  Is Root: {}", config.is_root);

    let handle = match SurrealHandle::setup_cloud(config).await {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("\n✗ Connection failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("\n✓ Connected to SurrealDB Cloud, schema initialized");

    let store = SurrealDocumentStore::new(Arc::new(handle));
    match store.list_top_level_keys("users").await {
        Ok(users) => println!("✓ {} known users", users.len()),
        Err(e) => {
            eprintln!("✗ Listing users failed: {}", e);
            std::process::exit(1);
        }
    }
}
