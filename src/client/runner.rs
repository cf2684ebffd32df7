use log::{debug, error, info, warn};
use std::future::Future;
use std::time::Duration;

use crate::geo::CoordinateSample;

use super::{should_update, ClientConfig, LastLocationStore, LocationSource, ReportSink};

/// Wait before asking the source again after it failed to produce a fix.
const NO_FIX_RETRY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Sent,
    Skipped,
    SendFailed,
    NoFix,
}

/// The client loop: sample, gate, send, sleep.
pub struct Runner<S, T> {
    config: ClientConfig,
    state: LastLocationStore,
    source: S,
    sink: T,
    last_sent: Option<CoordinateSample>,
}

impl<S: LocationSource, T: ReportSink> Runner<S, T> {
    pub fn new(config: ClientConfig, state: LastLocationStore, source: S, sink: T) -> Self {
        let last_sent = state.load();
        if let Some(last) = &last_sent {
            info!(
                "Resuming from {}, {} sent at {} ({})",
                last.latitude,
                last.longitude,
                last.timestamp,
                state.path().display()
            );
        }
        Self {
            config,
            state,
            source,
            sink,
            last_sent,
        }
    }

    /// One iteration. A failed send is not retried; the next iteration
    /// compares against the last sample that did get through.
    pub async fn step(&mut self) -> StepOutcome {
        let mut reading = match self.source.read() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Failed to get location: {}. Retrying...", e);
                return StepOutcome::NoFix;
            }
        };

        if !should_update(&self.config, &reading.sample, self.last_sent.as_ref()) {
            debug!(
                "Skipping update at {}, {}",
                reading.sample.latitude, reading.sample.longitude
            );
            return StepOutcome::Skipped;
        }

        if self.config.battery_monitor {
            reading.telemetry.battery = self.source.battery_level();
        }

        match self.sink.send(&self.config, &reading).await {
            Ok(()) => {
                info!(
                    "Location update sent successfully: {}, {}",
                    reading.sample.latitude, reading.sample.longitude
                );
                self.state.save(&reading.sample);
                self.last_sent = Some(reading.sample);
                StepOutcome::Sent
            }
            Err(e) => {
                error!("Error sending location update: {}", e);
                StepOutcome::SendFailed
            }
        }
    }

    /// Runs until Ctrl-C.
    pub async fn run(self) {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Runs until `shutdown` resolves. A send stuck on a slow server is
    /// abandoned as well as the sleep.
    pub async fn run_until<F: Future>(mut self, shutdown: F) {
        tokio::pin!(shutdown);

        loop {
            let iteration = async {
                let wait = match self.step().await {
                    StepOutcome::NoFix => NO_FIX_RETRY,
                    _ => self.config.update_interval(),
                };
                tokio::time::sleep(wait).await;
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("GPS tracker client stopped");
                    return;
                }
                _ = iteration => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, Reading};
    use crate::ingest::Telemetry;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSource {
        readings: VecDeque<Result<Reading, ClientError>>,
    }

    impl LocationSource for ScriptedSource {
        fn read(&mut self) -> Result<Reading, ClientError> {
            self.readings
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Location("script exhausted".into())))
        }

        fn battery_level(&mut self) -> Option<f64> {
            Some(42.0)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Reading>>,
        fail_next: Mutex<bool>,
    }

    impl ReportSink for &RecordingSink {
        async fn send(&self, _config: &ClientConfig, reading: &Reading) -> Result<(), ClientError> {
            let mut fail = self.fail_next.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(ClientError::Status {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            self.sent.lock().unwrap().push(reading.clone());
            Ok(())
        }
    }

    struct StalledSink;

    impl ReportSink for StalledSink {
        async fn send(&self, _config: &ClientConfig, _reading: &Reading) -> Result<(), ClientError> {
            std::future::pending().await
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    fn reading(secs: i64, lat: f64) -> Result<Reading, ClientError> {
        Ok(Reading {
            sample: CoordinateSample::new(lat, -74.0, t0() + ChronoDuration::seconds(secs)).unwrap(),
            telemetry: Telemetry::default(),
        })
    }

    fn temp_state() -> LastLocationStore {
        LastLocationStore::new(
            std::env::temp_dir().join(format!("runner-state-{}.json", uuid::Uuid::new_v4())),
        )
    }

    fn config() -> ClientConfig {
        ClientConfig {
            update_interval: 30,
            min_distance: 10.0,
            battery_monitor: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn gates_sends_and_persists_last_sample() {
        let sink = RecordingSink::default();
        let state = temp_state();
        let state_path = state.path().to_path_buf();
        let source = ScriptedSource {
            readings: VecDeque::from([
                reading(0, 40.0),
                reading(20, 40.001),   // too soon
                reading(40, 40.00002), // too close
                reading(60, 40.00045), // ~50 m
            ]),
        };
        let mut runner = Runner::new(config(), state, source, &sink);

        assert_eq!(runner.step().await, StepOutcome::Sent);
        assert_eq!(runner.step().await, StepOutcome::Skipped);
        assert_eq!(runner.step().await, StepOutcome::Skipped);
        assert_eq!(runner.step().await, StepOutcome::Sent);
        assert_eq!(runner.step().await, StepOutcome::NoFix);

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].telemetry.battery, Some(42.0));
        assert_eq!(runner.last_sent, Some(sent[1].sample));

        let persisted = LastLocationStore::new(&state_path).load();
        assert_eq!(persisted, Some(sent[1].sample));
        std::fs::remove_file(state_path).unwrap();
    }

    #[tokio::test]
    async fn failed_send_is_dropped_not_retried() {
        let sink = RecordingSink::default();
        *sink.fail_next.lock().unwrap() = true;
        let source = ScriptedSource {
            readings: VecDeque::from([reading(0, 40.0), reading(1, 40.0)]),
        };
        let state = temp_state();
        let state_path = state.path().to_path_buf();
        let mut runner = Runner::new(config(), state, source, &sink);

        assert_eq!(runner.step().await, StepOutcome::SendFailed);
        assert!(runner.last_sent.is_none());
        // Nothing was acknowledged, so the next sample counts as the first.
        assert_eq!(runner.step().await, StepOutcome::Sent);

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].sample.timestamp, t0() + ChronoDuration::seconds(1));
        std::fs::remove_file(state_path).unwrap();
    }

    #[tokio::test]
    async fn resumes_from_persisted_last_sample() {
        let sink = RecordingSink::default();
        let state = temp_state();
        let state_path = state.path().to_path_buf();
        state.save(&reading(0, 40.0).unwrap().sample);

        let source = ScriptedSource {
            readings: VecDeque::from([reading(10, 41.0)]),
        };
        let mut runner = Runner::new(config(), state, source, &sink);
        assert_eq!(runner.step().await, StepOutcome::Skipped);
        std::fs::remove_file(state_path).unwrap();
    }

    #[tokio::test]
    async fn battery_omitted_when_monitor_disabled() {
        let sink = RecordingSink::default();
        let source = ScriptedSource {
            readings: VecDeque::from([reading(0, 40.0)]),
        };
        let cfg = ClientConfig {
            battery_monitor: false,
            ..config()
        };
        let state = temp_state();
        let state_path = state.path().to_path_buf();
        let mut runner = Runner::new(cfg, state, source, &sink);
        runner.step().await;
        assert_eq!(sink.sent.lock().unwrap()[0].telemetry.battery, None);
        std::fs::remove_file(state_path).unwrap();
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_stalled_send() {
        let source = ScriptedSource {
            readings: VecDeque::from([reading(0, 40.0)]),
        };
        let state = temp_state();
        let state_path = state.path().to_path_buf();
        let runner = Runner::new(config(), state, source, StalledSink);

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run_until(tokio::time::sleep(Duration::from_millis(50))),
        )
        .await;
        assert!(stopped.is_ok());
        // The send never completed, so nothing was persisted.
        assert!(!state_path.exists());
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_interval_sleep() {
        let sink = RecordingSink::default();
        let source = ScriptedSource {
            readings: VecDeque::from([reading(0, 40.0)]),
        };
        let state = temp_state();
        let state_path = state.path().to_path_buf();
        let runner = Runner::new(config(), state, source, &sink);

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run_until(tokio::time::sleep(Duration::from_millis(50))),
        )
        .await;
        assert!(stopped.is_ok());
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
        std::fs::remove_file(state_path).unwrap();
    }
}
