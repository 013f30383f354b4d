pub mod doctor;

use anyhow::{Context, Result};
use async_trait::async_trait;
use evrelay_proto::{alert::AlertPayload, status::LinkReport};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Webhook receiving low-battery alerts.
    pub url: String,
    /// Request timeout. Unset means the post waits as long as the peer does.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("alert post failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("alert endpoint answered {status}")]
    Rejected { status: u16 },
}

/// Outbound side of a low-battery alert.
#[async_trait]
pub trait AlertGateway: Send + Sync {
    async fn post(&self, payload: &AlertPayload) -> Result<(), DeliveryError>;

    fn link_report(&self) -> LinkReport {
        LinkReport::default()
    }
}

/// Delivery bookkeeping. Informational only, nothing is retried off it.
#[derive(Debug, Clone, Default)]
pub struct LinkHealth {
    pub rtt_ms: Option<u32>,
    pub consecutive_failures: u32,
    pub delivered: u64,
    pub failed: u64,
}

impl LinkHealth {
    pub fn on_success(&mut self, rtt: Duration) {
        self.rtt_ms = Some(rtt.as_millis().min(u32::MAX as u128) as u32);
        self.consecutive_failures = 0;
        self.delivered += 1;
    }

    pub fn on_failure(&mut self) {
        self.consecutive_failures += 1;
        self.failed += 1;
    }

    pub fn report(&self) -> LinkReport {
        LinkReport {
            last_rtt_ms: self.rtt_ms,
            consecutive_failures: self.consecutive_failures,
            delivered: self.delivered,
            failed: self.failed,
        }
    }
}

/// JSON POST to a fixed webhook URL. Any non-2xx answer counts as a failure.
pub struct WebhookGateway {
    url: String,
    http: reqwest::Client,
    health: Mutex<LinkHealth>,
}

impl WebhookGateway {
    pub fn new(cfg: &AlertConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = cfg.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder.build().context("build alert http client")?;
        Ok(Self { url: cfg.url.clone(), http, health: Mutex::new(LinkHealth::default()) })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn health(&self) -> std::sync::MutexGuard<'_, LinkHealth> {
        self.health.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn send(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
        let resp = self.http.post(&self.url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected { status: status.as_u16() });
        }
        Ok(())
    }
}

#[async_trait]
impl AlertGateway for WebhookGateway {
    async fn post(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
        let start = Instant::now();
        let result = self.send(payload).await;

        let mut h = self.health();
        match result {
            Ok(()) => {
                let rtt = start.elapsed();
                h.on_success(rtt);
                info!("alert: delivered low battery alert: {}% (RTT: {}ms)", payload.battery_percentage, rtt.as_millis());
                Ok(())
            }
            Err(e) => {
                h.on_failure();
                warn!("alert: delivery failed (failures: {}): {:#}", h.consecutive_failures, e);
                Err(e)
            }
        }
    }

    fn link_report(&self) -> LinkReport {
        self.health().report()
    }
}
