use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use tokio_postgres::{Client, NoTls};

use crate::error::GatewayError;

// Spawn a lightweight keepalive task for a Postgres client connection.
// Jittered so pooled clients do not ping in lockstep; errors are ignored.
pub fn spawn_keepalive(client: Arc<Client>, min_secs: u64, max_secs: u64) {
    let max_secs = max_secs.max(min_secs + 1);
    tokio::spawn(async move {
        loop {
            let jitter = rand::rng().random_range(min_secs..=max_secs);
            tokio::time::sleep(std::time::Duration::from_secs(jitter)).await;
            let _ = tokio::time::timeout(
                std::time::Duration::from_secs(5),
                client.execute("SELECT 1", &[]),
            )
            .await;
        }
    });
}

/// Fixed set of connections handed out round-robin.
pub struct PgPool {
    clients: Vec<Arc<Client>>,
    next: AtomicUsize,
}

impl PgPool {
    pub async fn connect(pg_url: &str, size: usize) -> Result<Self, GatewayError> {
        let mut clients = Vec::with_capacity(size.max(1));
        for _ in 0..size.max(1) {
            let (client, connection) = tokio_postgres::connect(pg_url, NoTls)
                .await
                .map_err(|e| GatewayError::Config(format!("Failed to connect postgres: {}", e)))?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!("postgres connection error: {}", e);
                }
            });
            let client = Arc::new(client);
            spawn_keepalive(Arc::clone(&client), 240, 420);
            clients.push(client);
        }
        Ok(Self {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    pub fn pick(&self) -> Arc<Client> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len().max(1);
        Arc::clone(&self.clients[idx])
    }
}
