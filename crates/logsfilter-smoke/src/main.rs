//! Manual smoke test for event plugins.
//!
//! Loads one plugin package, posts 1000 synthetic block triggers through
//! the process-wide loader, then idles until Ctrl-C and stops the plugin.
//!
//! The package comes from `EVENT_PLUGIN_CONFIG` (a full TOML event
//! config) when set, otherwise from the first argument or
//! `EVENT_PLUGIN_PATH`.

use std::path::PathBuf;

use logsfilter_plugin::{BlockLogTrigger, EventLoader, EventPluginConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_PLUGIN_PATH: &str = "plugins/kafkaplugin";
const BLOCK_COUNT: i64 = 1000;
const BLOCK_HASH: &str = "0X123456789A";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let loader = EventLoader::instance();

    let loaded = match std::env::var("EVENT_PLUGIN_CONFIG") {
        Ok(config_path) => match EventPluginConfig::from_file(&PathBuf::from(&config_path)) {
            Ok(config) => loader.start(Some(&config)),
            Err(e) => {
                tracing::error!(config = %config_path, "invalid event plugin config: {e}");
                return;
            }
        },
        Err(_) => {
            let path = std::env::args()
                .nth(1)
                .or_else(|| std::env::var("EVENT_PLUGIN_PATH").ok())
                .unwrap_or_else(|| DEFAULT_PLUGIN_PATH.to_string());
            loader.start_plugin(&path)
        }
    };

    if !loaded {
        tracing::error!("no event plugin loaded, exiting");
        return;
    }

    for number in 0..BLOCK_COUNT {
        let trigger = BlockLogTrigger {
            block_hash: BLOCK_HASH.to_string(),
            block_number: number,
            time_stamp: chrono::Utc::now().timestamp_millis(),
            ..Default::default()
        };
        loader.post_block_trigger(&trigger);
    }

    tracing::info!(
        blocks = BLOCK_COUNT,
        listeners = loader.listener_count(),
        "posted block triggers, press Ctrl-C to stop"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }

    loader.stop_plugin();
}
