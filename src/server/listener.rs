use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::slots::{SharedSlots, SlotGuard, SlotTable};

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!(
        addr = %cfg.server.listen_addr,
        max_clients = cfg.server.max_clients,
        "Listening"
    );

    let slots: SharedSlots<SocketAddr> =
        Arc::new(Mutex::new(SlotTable::new(cfg.server.max_clients)));

    loop {
        let (socket, peer) = listener.accept().await?;

        let Some(slot) = SlotGuard::claim(&slots, peer) else {
            warn!(%peer, "No free connection slot, dropping connection");
            continue;
        };
        info!(%peer, slot = slot.id(), "Accepted connection");

        let uploads = cfg.uploads.clone();
        tokio::spawn(async move {
            let _slot = slot;
            let mut conn = Connection::new(socket, &uploads);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
