use std::{env, sync::Arc};

use log::{error, info, warn};

use openears_impls::{JsonFileStorage, SystemTiming};
use openears_server::{logging, run_server};
use openears_support::{Support, SupportConfig};

#[tokio::main]
async fn main() {
    logging::init_logger();

    let data_dir = env::var("OPENEARS_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

    let storage = match JsonFileStorage::new(&data_dir) {
        Ok(storage) => storage,
        Err(e) => {
            error!("Could not open the data directory at {data_dir}: {e}");
            return;
        }
    };

    let support = Arc::new(Support::new(
        SupportConfig::default(),
        storage,
        SystemTiming,
    ));

    // Pick up where the last run left off, if anyone was signed in
    if let Err(e) = support.session.restore().await {
        warn!("Could not restore the previous session: {e}");
    }

    info!("Initialized successfully.");

    run_server(support).await;
}
