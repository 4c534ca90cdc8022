use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

const PERSIST_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    shopd_observability::init();

    let addr = std::env::var("SHOP_ADDR").unwrap_or_else(|_| "127.0.0.1:6789".to_string());
    let data_dir = std::env::var("SHOP_DATA_DIR").unwrap_or_else(|_| "data".to_string());

    let shop = match shopd_server::Shop::open(&data_dir) {
        Ok(shop) => shop,
        Err(err) => {
            error!(dir = %data_dir, error = %err, "failed to open shop data");
            std::process::exit(1);
        }
    };

    // Crash insurance between explicit SAVEs: flush the event log and
    // rewrite the snapshots on a fixed cadence.
    let background = Arc::clone(&shop);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PERSIST_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tick.tick().await;
        loop {
            tick.tick().await;
            if let Err(err) = background.persist_all() {
                warn!(error = %err, "periodic persist failed");
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {addr}: {err}"));
    info!("listening on {}", listener.local_addr().unwrap());

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let shop = Arc::clone(&shop);
                tokio::spawn(async move {
                    if let Err(err) = shopd_server::session::run(shop, stream).await {
                        warn!(%peer, error = %err, "session ended with I/O error");
                    }
                });
            }
            Err(err) => warn!(error = %err, "accept failed"),
        }
    }
}
