use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kolekta::config::Config;
use kolekta::db::{create_pool, init_db, queries, AppState};
use kolekta::gateway::Przelewy24Client;
use kolekta::handlers;
use kolekta::models::{CreateFundraisingGoal, CreateParish};

#[derive(Parser, Debug)]
#[command(name = "kolekta")]
#[command(about = "Donation platform for religious parishes")]
struct Cli {
    /// Seed the database with dev data (two parishes, one goal)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with dev fixtures. Only runs in dev mode and when
/// the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM parishes", [], |row| row.get(0))
        .expect("Failed to count parishes");
    if existing > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let parish = queries::create_parish(
        &conn,
        &CreateParish {
            slug: "sw-anny-krakow".to_string(),
            name: "Parafia św. Anny".to_string(),
            city: "Kraków".to_string(),
            description: Some("Kolegiata uniwersytecka św. Anny".to_string()),
            contact_email: Some("kontakt@swanny.example.pl".to_string()),
        },
    )
    .expect("Failed to create dev parish");

    let goal = queries::create_fundraising_goal(
        &conn,
        &parish.id,
        &CreateFundraisingGoal {
            title: "Remont dachu".to_string(),
            description: Some("Wymiana pokrycia dachowego nawy głównej".to_string()),
            target_grosze: 25_000_000,
        },
    )
    .expect("Failed to create dev goal");

    let second = queries::create_parish(
        &conn,
        &CreateParish {
            slug: "mariacki-gdansk".to_string(),
            name: "Bazylika Mariacka".to_string(),
            city: "Gdańsk".to_string(),
            description: None,
            contact_email: None,
        },
    )
    .expect("Failed to create dev parish");

    tracing::info!("Parish: {} (id: {}, slug: {})", parish.name, parish.id, parish.slug);
    tracing::info!("Goal: {} (id: {})", goal.title, goal.id);
    tracing::info!("Parish: {} (id: {}, slug: {})", second.name, second.id, second.slug);
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kolekta=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        gateway: Arc::new(Przelewy24Client::new(&config.p24)),
        base_url: config.base_url.clone(),
        frontend_url: config.frontend_url.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set KOLEKTA_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = Router::new()
        .merge(handlers::public::router())
        .merge(handlers::webhooks::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Kolekta server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
