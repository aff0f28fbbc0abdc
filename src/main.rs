#![forbid(unsafe_code)]

mod api;
mod board;
mod config;
mod console;
mod models;
mod session;
mod status;
mod utils;

use std::{process::exit, str::FromStr, sync::Arc};

use api::ApiClient;
use board::{render_board, BoardSettings, BoardView};
use config::AppConfig;
use console::{Console, ConsoleCommand};
use session::{Role, SessionStore};
use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    select, signal,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utils::SystemClock;

#[tracing::instrument]
#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    "ctf_portal=info"
                        .parse()
                        .expect("Hard-coded default directive should be correct"),
                )
                .from_env_lossy(),
        )
        .init();

    if let Err(err) = dotenv_result {
        warn!("Could not load config from .env file: {err}");
    }

    let app_config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Could not load app config: {err}");
            exit(255);
        }
    };

    let settings = match app_config.board_settings() {
        Ok(settings) => settings,
        Err(err) => {
            error!("Invalid board settings: {err}");
            exit(255);
        }
    };

    if let Err(err) = run(app_config, settings).await {
        error!("{err:#}");
        exit(255);
    }
}

async fn run(app_config: AppConfig, settings: BoardSettings) -> anyhow::Result<()> {
    let session = Arc::new(SessionStore::new(
        app_config.student_token.clone(),
        app_config.admin_token.clone(),
    ));

    if !session.is_signed_in(Role::Student) {
        warn!("No student token configured, the backend will most likely reject requests");
    }

    let backend = Arc::new(ApiClient::new(
        &app_config.api_base_url,
        session.clone(),
        app_config.request_timeout(),
    )?);

    info!("Using backend at {}", app_config.api_base_url);

    let policy = settings.policy.clone();
    let query = settings.query.clone();

    let view = BoardView::activate(settings, backend.clone(), Arc::new(SystemClock), &session);
    let mut console = Console::new(view.handle(), backend, policy.clone(), query);
    let mut snapshots = view.subscribe();

    let mut lines = BufReader::new(stdin()).lines();
    let mut input_open = true;

    loop {
        select! {
            _ = signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            },

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }

                let snapshot = snapshots.borrow_and_update().clone();
                if !snapshot.refreshing || snapshot.signed_out {
                    println!("{}", render_board(&snapshot, &policy));
                }

                if snapshot.signed_out {
                    break;
                }
            },

            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    info!("Input closed, the board keeps running until Ctrl-C");
                    input_open = false;
                    continue;
                };

                if line.trim().is_empty() {
                    continue;
                }

                match ConsoleCommand::from_str(&line) {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => {
                        match console.execute(command).await {
                            Ok(Some(message)) => println!("{message}"),
                            Ok(None) => {}
                            Err(err) => println!("{err}"),
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            },
        }
    }

    view.deactivate().await;

    Ok(())
}
