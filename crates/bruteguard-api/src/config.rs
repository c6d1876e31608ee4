use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

/// Per-bucket capacity and refill rate, loaded from the environment.
#[derive(Debug, Clone, Copy)]
pub struct BucketConfig {
    pub capacity: u32,
    pub refill_per_minute: u32,
}

#[derive(Debug)]
pub struct Config {
    pub bind_addr: String,
    pub redis_addr: String,
    pub login_bucket: BucketConfig,
    pub pass_bucket: BucketConfig,
    pub ip_bucket: BucketConfig,
    pub key_ttl: Duration,
    pub decision_deadline: Duration,
    pub redis_pool_size: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {var} is not a valid {kind}: {value}")]
    InvalidVar {
        var: &'static str,
        kind: &'static str,
        value: String,
    },
}

fn env_u32(var: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar {
                var,
                kind: "u32",
                value,
            }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{port}"));
        let redis_addr =
            env::var("REDIS_ADDR").unwrap_or_else(|_| "127.0.0.1:6379".to_string());

        let login_bucket = BucketConfig {
            capacity: env_u32("CAPACITY_LOGIN", 10)?,
            refill_per_minute: env_u32("REFILL_LOGIN", 10)?,
        };
        let pass_bucket = BucketConfig {
            capacity: env_u32("CAPACITY_PASS", 100)?,
            refill_per_minute: env_u32("REFILL_PASS", 100)?,
        };
        let ip_bucket = BucketConfig {
            capacity: env_u32("CAPACITY_IP", 1000)?,
            refill_per_minute: env_u32("REFILL_IP", 1000)?,
        };

        let key_ttl_secs = env_u32("BUCKET_KEY_TTL_SECS", 300)?;
        let deadline_ms = env_u32("DECISION_DEADLINE_MS", 2_000)?;
        let redis_pool_size = env_u32("REDIS_POOL_SIZE", 8)? as usize;

        let config = Self {
            bind_addr,
            redis_addr,
            login_bucket,
            pass_bucket,
            ip_bucket,
            key_ttl: Duration::from_secs(key_ttl_secs as u64),
            decision_deadline: Duration::from_millis(deadline_ms as u64),
            redis_pool_size,
        };
        config.log();
        Ok(config)
    }

    fn log(&self) {
        info!(
            bind_addr = %self.bind_addr,
            redis_addr = %self.redis_addr,
            login_capacity = self.login_bucket.capacity,
            login_refill_per_min = self.login_bucket.refill_per_minute,
            pass_capacity = self.pass_bucket.capacity,
            pass_refill_per_min = self.pass_bucket.refill_per_minute,
            ip_capacity = self.ip_bucket.capacity,
            ip_refill_per_min = self.ip_bucket.refill_per_minute,
            key_ttl_secs = self.key_ttl.as_secs(),
            decision_deadline_ms = self.decision_deadline.as_millis() as u64,
            redis_pool_size = self.redis_pool_size,
            "loaded configuration"
        );
    }
}
