//! Per-client token-bucket rate limiter.
//!
//! Each client address owns a bucket that refills continuously at `rps`
//! tokens per second up to `burst`. A request takes one token or is refused.
//! The outer map is only write-locked to create or evict buckets; each bucket
//! has its own mutex, so clients never serialize against one another while
//! requests from one client are linearizable.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// When false every request is admitted.
    pub enabled: bool,
    /// Refill rate in tokens per second.
    pub rps: f64,
    /// Bucket capacity.
    pub burst: u32,
    /// Buckets unused for this long are evicted by the sweeper.
    pub idle_timeout: Duration,
    pub sweep_interval: Duration,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rps: 2.0,
            burst: 4,
            idle_timeout: Duration::from_secs(180),
            sweep_interval: Duration::from_secs(60),
            trust_proxy_headers: false,
        }
    }
}

#[derive(Debug)]
struct ClientBucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    clients: RwLock<HashMap<IpAddr, Arc<Mutex<ClientBucket>>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Try to admit one request from `addr`.
    pub fn allow(&self, addr: IpAddr) -> bool {
        self.allow_at(addr, Instant::now())
    }

    /// [`allow`](Self::allow) against an explicit clock reading.
    pub fn allow_at(&self, addr: IpAddr, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let bucket = self.bucket_for(addr, now);
        let mut bucket = bucket.lock();

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens =
            (bucket.tokens + elapsed.as_secs_f64() * self.config.rps).min(self.burst());
        bucket.last_refill = bucket.last_refill.max(now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn burst(&self) -> f64 {
        f64::from(self.config.burst)
    }

    fn bucket_for(&self, addr: IpAddr, now: Instant) -> Arc<Mutex<ClientBucket>> {
        if let Some(bucket) = self.clients.read().get(&addr) {
            return Arc::clone(bucket);
        }

        let mut clients = self.clients.write();
        let bucket = clients.entry(addr).or_insert_with(|| {
            Arc::new(Mutex::new(ClientBucket {
                tokens: f64::from(self.config.burst),
                last_refill: now,
            }))
        });
        Arc::clone(bucket)
    }

    /// Evict buckets idle for longer than `idle_timeout` as of `now`.
    ///
    /// A bucket currently held by an in-flight request is never evicted.
    /// Returns the number of buckets removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let idle = self.config.idle_timeout;
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|_, bucket| {
            if Arc::strong_count(bucket) > 1 {
                return true;
            }
            now.saturating_duration_since(bucket.lock().last_refill) < idle
        });
        before - clients.len()
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Run [`sweep_at`](Self::sweep_at) every `sweep_interval` until `shutdown`
    /// is cancelled.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.sweep_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = self.sweep_at(Instant::now());
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining = self.client_count(), "Rate limiter sweep");
                        }
                    }
                }
            }
            tracing::info!("Rate limiter sweeper stopped");
        })
    }
}
