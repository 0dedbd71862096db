use color_eyre::{eyre::eyre, Result};
use inputstore::controller::{spawn_collector, CollectorSettings};
use inputstore::{InputEvent, InputStoreHandle, StoreSettings};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings = StoreSettings::load_or_create(&StoreSettings::default_path()).await;
    settings
        .validate()
        .map_err(|e| eyre!("Invalid settings: {}", e))?;

    let collector_settings = CollectorSettings {
        trigger_press_threshold: settings.trigger_press_threshold,
        poll_interval_us: settings.poll_interval_us,
    };

    info!("Starting input store");
    let (store, store_task) = InputStoreHandle::spawn(settings);

    store
        .set_connection_handler(Some(Box::new(|connected: bool| {
            info!("Connection changed: {}", connected);
        })))
        .await?;

    store
        .register_handler(None, |event: &InputEvent| {
            info!(
                "P{} {:?} {} {}",
                event.player,
                event.button,
                if event.pressed { "pressed" } else { "released" },
                event
                    .value
                    .map(|v| format!("({:.2})", v))
                    .unwrap_or_default()
            );
        })
        .await?;

    let _collector = spawn_collector(Some(collector_settings), store.command_sender());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    store.shutdown().await?;
    store_task.await?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
