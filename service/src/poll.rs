use std::{
    fmt::Display,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use protocol::Payload;
use tracing::instrument;

use crate::{PayloadSink, Sensor, TemperatureSource};

/// Time between two display updates.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Reads both temperatures, encodes them and pushes them to the display.
#[derive(Debug)]
pub struct PollLoop<C, G, S> {
    cpu: C,
    gpu: G,
    sink: S,
}

impl<C, G, S> PollLoop<C, G, S>
where
    C: TemperatureSource,
    G: TemperatureSource,
    S: PayloadSink,
    S::Error: Display,
{
    pub fn new(cpu: C, gpu: G, sink: S) -> Self {
        Self { cpu, gpu, sink }
    }

    /// Runs a single update. Delivery failures are logged and otherwise
    /// ignored; the next tick simply tries again.
    #[instrument(skip_all)]
    pub fn tick(&mut self) -> Payload {
        let cpu = self.cpu.read();
        let gpu = self.gpu.read();

        for (sensor, reading) in [(Sensor::Cpu, cpu), (Sensor::Gpu, gpu)] {
            if !reading.is_available() {
                tracing::debug!(%sensor, "temperature unavailable, showing 0.0");
            }
        }

        let payload = Payload::new(cpu, gpu);
        tracing::trace!(cpu = cpu.celsius(), gpu = gpu.celsius(), "payload: {payload:x}");

        if let Err(e) = self.sink.send(&payload) {
            tracing::warn!("{e}");
        }

        payload
    }

    /// Ticks every [`POLL_INTERVAL`] until `running` is cleared.
    ///
    /// The flag is only checked between iterations, so a transfer in flight
    /// always completes.
    pub fn run(&mut self, running: &AtomicBool) {
        tracing::info!("updating display every {POLL_INTERVAL:?}");

        while running.load(Ordering::SeqCst) {
            self.tick();
            thread::sleep(POLL_INTERVAL);
        }

        tracing::info!("stopped");
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
    };

    use protocol::{Payload, Reading};
    use thiserror::Error as ThisError;

    use super::PollLoop;
    use crate::{Disabled, PayloadSink, TemperatureSource};

    struct Scripted(VecDeque<Reading>);

    impl Scripted {
        fn new(readings: &[Reading]) -> Self {
            Self(readings.iter().copied().collect())
        }
    }

    impl TemperatureSource for Scripted {
        fn read(&mut self) -> Reading {
            self.0.pop_front().unwrap_or_default()
        }
    }

    #[derive(Debug, ThisError)]
    #[error("unplugged")]
    struct Unplugged;

    /// Records payloads and fails every other send. Clears `running` once
    /// `limit` payloads were attempted.
    struct Recorder {
        sent: Vec<Payload>,
        attempts: usize,
        limit: usize,
        running: Arc<AtomicBool>,
    }

    impl Recorder {
        fn new(limit: usize, running: Arc<AtomicBool>) -> Self {
            Self {
                sent: Vec::new(),
                attempts: 0,
                limit,
                running,
            }
        }
    }

    impl PayloadSink for Recorder {
        type Error = Unplugged;

        fn send(&mut self, payload: &Payload) -> Result<(), Self::Error> {
            self.attempts += 1;

            if self.attempts >= self.limit {
                self.running.store(false, Ordering::SeqCst);
            }

            if self.attempts % 2 == 0 {
                return Err(Unplugged);
            }

            self.sent.push(*payload);
            Ok(())
        }
    }

    #[test]
    fn test_tick_encodes_readings() {
        let running = Arc::new(AtomicBool::new(true));
        let cpu = Scripted::new(&[Reading::Celsius(25.3)]);
        let gpu = Scripted::new(&[Reading::Celsius(60.7)]);
        let mut poll = PollLoop::new(cpu, gpu, Recorder::new(usize::MAX, running));

        let payload = poll.tick();

        assert_eq!(
            payload.as_bytes(),
            &[0x55, 0xAA, 0x01, 0x01, 0x06, 0x02, 0x05, 0x03, 0x06, 0x00, 0x07, 0x1E]
        );
        assert_eq!(poll.sink().sent, [payload]);
    }

    #[test]
    fn test_tick_with_unavailable_sensors() {
        let running = Arc::new(AtomicBool::new(true));
        let cpu = Scripted::new(&[Reading::Unavailable]);
        let mut poll = PollLoop::new(cpu, Disabled, Recorder::new(usize::MAX, running));

        let payload = poll.tick();

        assert_eq!(payload, Payload::new(Reading::Unavailable, Reading::Unavailable));
        assert_eq!(payload.checksum(), 7);
    }

    #[test]
    fn test_send_failure_is_swallowed() {
        let running = Arc::new(AtomicBool::new(true));
        let cpu = Scripted::new(&[Reading::Celsius(30.0), Reading::Celsius(31.0)]);
        let mut poll = PollLoop::new(cpu, Disabled, Recorder::new(usize::MAX, running));

        poll.tick();
        let failed = poll.tick();

        assert_eq!(poll.sink().attempts, 2);
        assert_eq!(poll.sink().sent.len(), 1);
        assert_eq!(failed.cpu_digits(), [3, 1, 0]);
    }

    #[test]
    fn test_run_until_stopped() {
        let running = Arc::new(AtomicBool::new(true));
        let cpu = Scripted::new(&[
            Reading::Celsius(40.0),
            Reading::Celsius(41.0),
            Reading::Celsius(42.0),
        ]);
        let mut poll = PollLoop::new(cpu, Disabled, Recorder::new(3, running.clone()));

        poll.run(&running);

        let sent: Vec<_> = poll.sink().sent.iter().map(Payload::cpu_digits).collect();
        assert_eq!(poll.sink().attempts, 3);
        assert_eq!(sent, [[4, 0, 0], [4, 2, 0]]);
    }

    #[test]
    fn test_run_stopped_before_start() {
        let running = Arc::new(AtomicBool::new(false));
        let mut poll = PollLoop::new(Disabled, Disabled, Recorder::new(1, running.clone()));

        poll.run(&running);

        assert_eq!(poll.sink().attempts, 0);
    }
}
