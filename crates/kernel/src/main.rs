//! AGNSTK
//!
//! Serves the configured site over HTTP, or renders it from the command line.

use std::net::SocketAddr;

use agnstk_kernel::auth::UserContext;
use agnstk_kernel::config::Config;
use agnstk_kernel::state::AppState;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// AGNSTK content pipeline.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Render one page to stdout.
    Render {
        /// Page id, as configured.
        page_id: String,

        /// Render as a logged-in user.
        #[arg(long)]
        logged_in: bool,
    },

    /// List pages and whether they are enabled.
    Pages {
        /// Evaluate enabled rules for a logged-in user.
        #[arg(long)]
        logged_in: bool,
    },

    /// Print the menus as JSON.
    Menu {
        /// Build menus for a logged-in user.
        #[arg(long)]
        logged_in: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, root = %config.app_root.display(), "Configuration loaded");

    let port = config.port;
    let state = AppState::new(config).context("failed to initialize application state")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, port).await,
        Command::Render { page_id, logged_in } => {
            let html = state
                .render_page(&page_id, &user(logged_in))
                .with_context(|| format!("failed to render page {page_id}"))?;
            println!("{html}");
            Ok(())
        }
        Command::Pages { logged_in } => {
            let auth = user(logged_in);
            for id in state.pages().ids() {
                if let Some(page) = state.pages().get_page_config(id, &auth) {
                    let status = if page.enabled { "enabled" } else { "disabled" };
                    println!("{:<24} {:<24} {:<9} {}", page.id, page.uri, status, page.title);
                }
            }
            Ok(())
        }
        Command::Menu { logged_in } => {
            let menus = state.menus(&user(logged_in));
            let json = serde_json::to_string_pretty(&menus).context("failed to encode menus")?;
            println!("{json}");
            Ok(())
        }
    }
}

async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = agnstk_kernel::build_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn user(logged_in: bool) -> UserContext {
    if logged_in {
        UserContext::authenticated()
    } else {
        UserContext::anonymous()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
