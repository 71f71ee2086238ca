//! Load simulator: many devices logging at once.
//!
//! Device `i` (counting from 1) reports as `"(192.168.1.{10 + i})"` and
//! sends canned messages at random intervals. Levels are drawn from
//! [`DEVICE_LEVELS`], which weights `INFO` double.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use loghub_proto::LogLevel;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::producer::LogClient;

/// Levels a simulated device picks from, uniformly.
pub const DEVICE_LEVELS: [LogLevel; 5] = [
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Warning,
    LogLevel::Error,
    LogLevel::Critical,
];

/// Canned messages for `level`.
#[must_use]
pub fn canned_messages(level: &LogLevel) -> &'static [&'static str] {
    match level {
        LogLevel::Info => &["Connection established", "Ping response: 15ms", "Resource usage: Normal"],
        LogLevel::Warning => &["Response time exceeds threshold", "CPU fan speed high"],
        LogLevel::Error => &["Packet loss detected", "Authentication timeout"],
        LogLevel::Critical => &["Service failure!", "Security breach: multiple failed logins"],
        LogLevel::Other(_) => &["Unclassified event"],
    }
}

/// Source label of device `index`.
#[must_use]
pub fn device_source(index: usize) -> String {
    format!("(192.168.1.{})", 10 + index)
}

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Number of simulated devices.
    pub devices: usize,
    /// Messages each device sends; `None` runs until cancelled.
    pub messages_per_device: Option<u64>,
    /// Shortest pause between two messages of one device.
    pub min_delay: Duration,
    /// Longest pause between two messages of one device.
    pub max_delay: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            devices: 5,
            messages_per_device: None,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Totals of a finished simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Entries handed to the service.
    pub sent: u64,
    /// Entries that could not be delivered.
    pub failed: u64,
}

/// Drives a set of simulated devices through one shared [`LogClient`].
#[derive(Debug, Clone)]
pub struct Simulator {
    client: LogClient,
    config: SimulatorConfig,
}

impl Simulator {
    /// Creates a simulator.
    #[must_use]
    pub const fn new(client: LogClient, config: SimulatorConfig) -> Self {
        Self { client, config }
    }

    /// Runs every device concurrently until each has sent its quota.
    ///
    /// Without a quota this never returns; drop the future to stop it.
    pub async fn run(&self) -> SimulationReport {
        info!(devices = self.config.devices, "Starting simulation");

        let report = stream::iter(1..=self.config.devices)
            .map(|index| self.run_device(index))
            .buffer_unordered(self.config.devices.max(1))
            .fold(SimulationReport::default(), |acc, r| async move {
                SimulationReport {
                    sent: acc.sent + r.sent,
                    failed: acc.failed + r.failed,
                }
            })
            .await;

        info!(sent = report.sent, failed = report.failed, "Simulation finished");
        report
    }

    async fn run_device(&self, index: usize) -> SimulationReport {
        let source = device_source(index);
        let mut report = SimulationReport::default();
        debug!(source = %source, "Device online");

        let mut remaining = self.config.messages_per_device;
        while remaining != Some(0) {
            let (level, message, pause) = self.next_event();
            match self.client.try_log(level, message, Some(source.as_str())).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    debug!(source = %source, error = %e, "Device failed to deliver");
                    report.failed += 1;
                }
            }
            remaining = remaining.map(|n| n - 1);

            if remaining != Some(0) {
                tokio::time::sleep(pause).await;
            }
        }
        report
    }

    fn next_event(&self) -> (LogLevel, &'static str, Duration) {
        let mut rng = rand::thread_rng();
        let level = DEVICE_LEVELS.choose(&mut rng).cloned().unwrap_or(LogLevel::Info);
        let message = canned_messages(&level).choose(&mut rng).copied().unwrap_or_default();

        let (min, max) = (self.config.min_delay, self.config.max_delay.max(self.config.min_delay));
        let pause = if max > min {
            rng.gen_range(min..=max)
        } else {
            min
        };
        (level, message, pause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loghub_proto::{read_frame, Request, MAX_FRAME_SIZE};
    use std::collections::HashSet;
    use test_case::test_case;
    use tokio::net::TcpListener;

    #[test_case(1, "(192.168.1.11)" ; "first device")]
    #[test_case(2, "(192.168.1.12)" ; "second device")]
    #[test_case(20, "(192.168.1.30)" ; "twentieth device")]
    fn device_sources(index: usize, expected: &str) {
        assert_eq!(device_source(index), expected);
    }

    #[test]
    fn every_device_level_has_messages() {
        for level in &DEVICE_LEVELS {
            assert!(!canned_messages(level).is_empty());
        }
    }

    #[test]
    fn info_is_weighted_double() {
        let info = DEVICE_LEVELS.iter().filter(|l| **l == LogLevel::Info).count();
        assert_eq!(info, 2);
    }

    #[test]
    fn next_event_respects_delay_bounds() {
        let config = SimulatorConfig {
            min_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(50),
            ..SimulatorConfig::default()
        };
        let sim = Simulator::new(LogClient::new("127.0.0.1:5000"), config);

        for _ in 0..200 {
            let (level, message, pause) = sim.next_event();
            assert!(DEVICE_LEVELS.contains(&level));
            assert!(canned_messages(&level).contains(&message));
            assert!(pause >= Duration::from_millis(20) && pause <= Duration::from_millis(50));
        }
    }

    #[tokio::test]
    async fn devices_send_their_quota() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        let collector = tokio::spawn(async move {
            let mut sources = Vec::new();
            for _ in 0..6 {
                let (mut stream, _) = listener.accept().await.expect("accept");
                let body = read_frame(&mut stream, MAX_FRAME_SIZE).await.expect("frame");
                if let Request::Submit { entry } = Request::from_bytes(&body).expect("request") {
                    sources.push(entry.source);
                }
            }
            sources
        });

        let config = SimulatorConfig {
            devices: 2,
            messages_per_device: Some(3),
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };
        let report = Simulator::new(LogClient::new(addr), config).run().await;

        assert_eq!(report, SimulationReport { sent: 6, failed: 0 });
        let sources = collector.await.expect("join");
        assert_eq!(sources.len(), 6);
        let distinct: HashSet<_> = sources.into_iter().collect();
        assert_eq!(
            distinct,
            HashSet::from(["(192.168.1.11)".to_string(), "(192.168.1.12)".to_string()])
        );
    }

    #[tokio::test]
    async fn unreachable_service_counts_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        drop(listener);

        let config = SimulatorConfig {
            devices: 3,
            messages_per_device: Some(2),
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };
        let report = Simulator::new(LogClient::new(addr), config).run().await;
        assert_eq!(report, SimulationReport { sent: 0, failed: 6 });
    }
}
