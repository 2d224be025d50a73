// Sentinel - Monitor Task
//
// Runs a `GestureEngine` on one dedicated thread.  Producers (sensor task,
// button task, host app) submit inputs through a cloneable `MonitorHandle`;
// the worker drains them in arrival order and sleeps until either the next
// input or the next timer deadline, whichever comes first.  That single
// thread is the serialized context every classifier call runs on.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::config::{SentinelConfig, STACK_MONITOR};
use crate::engine::GestureEngine;
use crate::events::{ButtonId, DistressSink, Input, SensorSample};

enum Command {
    Input(Input),
    Stop,
}

/// Producer side of a running monitor.
#[derive(Clone)]
pub struct MonitorHandle {
    tx: Sender<Command>,
    epoch: Instant,
}

impl MonitorHandle {
    /// Milliseconds on the monitor's monotonic clock. Inputs submitted with
    /// explicit timestamps must come from this clock.
    pub fn now_ms(&self) -> u64 {
        elapsed_ms(self.epoch)
    }

    pub fn submit(&self, input: Input) -> Result<()> {
        self.tx
            .send(Command::Input(input))
            .map_err(|_| anyhow!("monitor has stopped"))
    }

    pub fn sample(&self, x: f32, y: f32, z: f32) -> Result<()> {
        self.submit(Input::Sample(SensorSample::new(x, y, z, self.now_ms())))
    }

    pub fn button_down(&self, button: ButtonId) -> Result<()> {
        self.submit(Input::ButtonDown { button, timestamp_ms: self.now_ms() })
    }

    pub fn button_up(&self, button: ButtonId) -> Result<()> {
        self.submit(Input::ButtonUp { button, timestamp_ms: self.now_ms() })
    }
}

pub struct Monitor<S> {
    handle: MonitorHandle,
    worker: JoinHandle<S>,
}

impl<S: DistressSink + Send + 'static> Monitor<S> {
    pub fn spawn(config: SentinelConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = mpsc::channel();
        let epoch = Instant::now();

        let worker = thread::Builder::new()
            .name("monitor".into())
            .stack_size(STACK_MONITOR)
            .spawn(move || monitor_task(GestureEngine::new(&config, sink), rx, epoch))?;

        Ok(Self {
            handle: MonitorHandle { tx, epoch },
            worker,
        })
    }

    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Cancel all timers, join the worker and hand back the sink.
    pub fn stop(self) -> Result<S> {
        // A dead worker already dropped the receiver; join reports why.
        let _ = self.handle.tx.send(Command::Stop);
        self.worker
            .join()
            .map_err(|_| anyhow!("monitor thread panicked"))
    }
}

fn monitor_task<S: DistressSink>(
    mut engine: GestureEngine<S>,
    rx: Receiver<Command>,
    epoch: Instant,
) -> S {
    log::info!("Monitor task started");

    loop {
        let received = match engine.next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_sub(elapsed_ms(epoch));
                rx.recv_timeout(Duration::from_millis(wait))
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Command::Input(input)) => engine.handle(input),
            Err(RecvTimeoutError::Timeout) => engine.advance_to(elapsed_ms(epoch)),
            Ok(Command::Stop) => break,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Input channel closed, stopping monitor");
                break;
            }
        }
    }

    engine.stop();
    engine.into_sink()
}

fn elapsed_ms(epoch: Instant) -> u64 {
    duration_ms(epoch.elapsed())
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GestureEvent;

    #[test]
    fn rapid_presses_reach_the_sink() {
        let (tx, rx) = mpsc::channel();
        let monitor = Monitor::spawn(SentinelConfig::default(), tx).unwrap();
        let handle = monitor.handle();

        for _ in 0..3 {
            handle.button_down(ButtonId::VolumeUp).unwrap();
            handle.button_up(ButtonId::VolumeUp).unwrap();
        }
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            GestureEvent::PoliceNeeded
        );
        monitor.stop().unwrap();
    }

    #[test]
    fn clock_saturates_instead_of_wrapping() {
        assert_eq!(duration_ms(Duration::from_millis(1234)), 1234);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn stop_returns_the_sink_and_closes_handles() {
        let monitor = Monitor::spawn(SentinelConfig::default(), Vec::<GestureEvent>::new()).unwrap();
        let handle = monitor.handle();
        handle.sample(0.0, 0.0, 30.0).unwrap();

        let events = monitor.stop().unwrap();
        assert_eq!(events, vec![GestureEvent::Shake(1)]);
        assert!(handle.button_down(ButtonId::VolumeDown).is_err());
    }
}
