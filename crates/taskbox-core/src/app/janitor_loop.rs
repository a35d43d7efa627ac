//! JanitorLoop - idle partition eviction
//!
//! Partitions are created lazily per client identity and would otherwise live
//! for the whole process. The janitor drops the ones nobody touched for `ttl`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::store::PartitionedStore;

/// Handle on the background eviction task.
/// - `shutdown_and_join()` で停止して終了を待つ
pub struct JanitorLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl JanitorLoop {
    pub fn spawn(store: Arc<PartitionedStore>, ttl: Duration, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 最初の tick は即時に返るので読み捨てる
            ticker.tick().await;

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let evicted = store.evict_idle(ttl).await;
                        if evicted > 0 {
                            tracing::info!(
                                evicted,
                                ttl_secs = ttl.as_secs(),
                                "evicted idle partitions"
                            );
                        }
                    }
                }
            }
        });

        Self { shutdown_tx, join }
    }

    pub async fn shutdown_and_join(self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
        let _ = self.join.await;
    }
}
