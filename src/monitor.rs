//! Supervisory polling loop.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::{Condvar, Mutex};

use crate::config::MonitorConfig;
use crate::error::Error;
use crate::sink::{Level, LogSink};

// VALUE_DELIMITER joins per-sensor values in a DATA record.
const VALUE_DELIMITER: &str = ",";

/// A source of integer measurements the monitor can poll.
pub trait Sensor {
    /// Takes one reading.
    fn read(&mut self) -> Result<u16, Error>;

    /// Releases the underlying transport. Must be idempotent.
    fn close(&mut self);
}

impl<S: Sensor + ?Sized> Sensor for Box<S> {
    fn read(&mut self) -> Result<u16, Error> {
        (**self).read()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Lifecycle of a [`Monitor`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MonitorState {
    /// Sensors are being attached.
    Starting,
    /// The polling loop is active.
    Running,
    /// Sensors are being closed.
    Stopping,
    /// Every sensor has been closed.
    Stopped,
}

/// A stop request flag that can be raised from any thread.
///
/// Clones share the same flag. Raising it wakes a monitor blocked in
/// [`StopSignal::wait`] immediately; it never touches a transport.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Raising it again has no effect.
    pub fn stop(&self) {
        let (stopped, wakeup) = &*self.inner;
        *stopped.lock() = true;
        wakeup.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Sleeps for `timeout` or until the flag is raised.
    ///
    /// Returns `true` if the flag is raised.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (stopped, wakeup) = &*self.inner;
        let mut guard = stopped.lock();
        if !*guard {
            // Loops over spurious wakeups until the deadline.
            let _ = wakeup.wait_while_for(&mut guard, |stopped| !*stopped, timeout);
        }
        *guard
    }
}

/// Polls a set of named sensors on a fixed cadence and logs their readings.
///
/// Transient sensor errors are logged and retried after the recovery delay;
/// any other error stops the monitor. Every sensor is closed exactly once,
/// whichever way the monitor stops.
///
/// # Type Parameters
///
/// * `L`: Destination of the DATA, WARNING and lifecycle records.
pub struct Monitor<L: LogSink> {
    name: String,
    config: MonitorConfig,
    sensors: Vec<(String, Box<dyn Sensor>)>,
    sink: L,
    stop: StopSignal,
    state: MonitorState,
}

impl<L: LogSink> Monitor<L> {
    /// Creates a monitor with no sensors attached.
    ///
    /// # Arguments
    ///
    /// * `config` - Sample interval and recovery delay.
    /// * `sink` - Where records go.
    /// * `stop` - Flag observed between cycles; raise it to end [`Monitor::run`].
    pub fn new(config: MonitorConfig, sink: L, stop: StopSignal) -> Self {
        Self {
            name: String::new(),
            config,
            sensors: Vec::new(),
            sink,
            stop,
            state: MonitorState::Starting,
        }
    }

    /// Attaches a sensor. Readings are logged in attachment order.
    pub fn with_sensor(mut self, name: impl Into<String>, sensor: Box<dyn Sensor>) -> Self {
        let name = name.into();
        if !self.name.is_empty() {
            self.name.push('-');
        }
        self.name.push_str(&name);
        self.sensors.push((name, sensor));
        self
    }

    /// Sensor names joined by `-`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == MonitorState::Running && !self.stop.is_stopped()
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    /// Runs the polling loop until a stop is requested or a fatal error occurs.
    ///
    /// # Returns
    ///
    /// * `Ok(())` after an external stop request.
    /// * `Err(Error)` with the fatal error that stopped the loop.
    ///
    /// In both cases every sensor has been closed on return.
    pub fn run(&mut self) -> Result<(), Error> {
        if self.state != MonitorState::Starting {
            return Ok(());
        }
        self.state = MonitorState::Running;
        let message = format!(
            "Starting {} monitor (measuring every {}s)",
            self.name,
            self.config.sample_interval.as_secs_f64()
        );
        info!("{}", message);
        self.sink.log(Level::Info, &message);

        let outcome = loop {
            if self.stop.is_stopped() {
                break Ok(());
            }

            let delay = match self.poll() {
                Ok(values) => {
                    self.sink.log(Level::Data, &values);
                    self.config.sample_interval
                }
                Err((name, e)) if e.is_transient() => {
                    self.sink
                        .log(Level::Warning, &format!("Sensor error ({}): {}", name, e));
                    self.config.recovery_delay
                }
                Err((name, e)) => {
                    self.sink
                        .log(Level::Error, &format!("Unexpected error ({}): {}", name, e));
                    break Err(e);
                }
            };

            if self.stop.wait(delay) {
                break Ok(());
            }
        };

        self.shutdown();
        outcome
    }

    /// Stops the monitor and closes every sensor.
    ///
    /// Only the first call has an effect.
    pub fn shutdown(&mut self) {
        if matches!(self.state, MonitorState::Stopping | MonitorState::Stopped) {
            return;
        }
        self.state = MonitorState::Stopping;
        self.stop.stop();

        let message = format!("Shutting down {} monitor...", self.name);
        info!("{}", message);
        self.sink.log(Level::Info, &message);

        for (name, sensor) in &mut self.sensors {
            debug!("Closing sensor {}", name);
            sensor.close();
        }
        self.state = MonitorState::Stopped;
    }

    // Reads every sensor once and formats the values for a DATA record.
    fn poll(&mut self) -> Result<String, (String, Error)> {
        let mut values = Vec::with_capacity(self.sensors.len());
        for (name, sensor) in &mut self.sensors {
            let value = sensor.read().map_err(|e| (name.clone(), e))?;
            values.push(value.to_string());
        }
        Ok(values.join(VALUE_DELIMITER))
    }
}

impl<L: LogSink> Drop for Monitor<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
