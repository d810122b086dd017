//! Background service starters.

use crate::error::Result;
use crate::eta::estimate_rate;
use std::time::Duration;

use super::Archiver;

impl Archiver {
    /// Recompute the replies-per-second estimate from recent successful jobs
    ///
    /// Returns the rate now in effect (the configured default when there is
    /// no usable history).
    pub async fn refresh_rate_estimate(&self) -> Result<f64> {
        let samples = self
            .db
            .recent_eta_samples(self.config.eta.sample_size)
            .await?;
        let rate = self.rate.publish(estimate_rate(&samples));

        tracing::debug!(samples = samples.len(), rate, "Rate estimate refreshed");
        Ok(rate)
    }

    /// Start the task that refreshes the rate estimate now and then every
    /// `eta.refresh_interval`
    pub fn start_rate_estimator(&self) -> tokio::task::JoinHandle<()> {
        let archiver = self.clone();
        // interval() rejects a zero period
        let period = self.config.eta.refresh_interval.max(Duration::from_secs(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                // The first tick completes immediately
                interval.tick().await;
                if let Err(e) = archiver.refresh_rate_estimate().await {
                    tracing::warn!(error = %e, "Failed to refresh rate estimate");
                }
            }
        });

        tracing::info!(
            period_secs = period.as_secs(),
            "Rate estimator background task started"
        );

        handle
    }

    /// Replies per second currently assumed by ETA projections
    pub fn current_rate(&self) -> f64 {
        self.rate.get()
    }
}
