// src/config.rs

use std::env;
use std::time::Duration;
use dotenvy::dotenv;

use chrono::{FixedOffset, Offset, Utc};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub questions_path: String,
    pub bind_addr: String,
    /// UTC offset used for dates in the exported report.
    pub report_utc_offset_hours: i32,
    /// Seconds a quiz session stays addressable after it starts.
    pub session_ttl_secs: u64,
    /// Milliseconds a submit waits on the store before reporting it unavailable.
    pub store_timeout_ms: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quiz.db?mode=rwc".to_string());

        let questions_path = env::var("QUESTIONS_PATH")
            .unwrap_or_else(|_| "questions.json".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let report_utc_offset_hours = env::var("REPORT_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3 * 60 * 60);

        let store_timeout_ms = env::var("STORE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            questions_path,
            bind_addr,
            report_utc_offset_hours,
            session_ttl_secs,
            store_timeout_ms,
            rust_log,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Falls back to UTC when the configured offset is out of range.
    pub fn report_offset(&self) -> FixedOffset {
        self.report_utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}
