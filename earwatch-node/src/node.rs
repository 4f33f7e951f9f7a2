//! The super-loop
//!
//! Every tick runs in a fixed order: take at most one inbound line and feed
//! a verdict to the alarm, service the alarm, then run a capture cycle if
//! the capture interval has passed. Only the capture cycle blocks, and only
//! for its bounded flush and read.

use crate::config::{NodeConfig, SchedulerConfig};
use crate::error::NodeError;
use crate::startup;
use earwatch_alarm::{AlarmOutputs, AlertFsm, TickOutcome, VerdictOutcome};
use earwatch_core::{Clock, Verdict};
use earwatch_sc::{CaptureCycle, CaptureStats, CycleOutcome, Microphone};
use earwatch_wire::{decode_line, FrameSink, LineSource};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Collaborators the node is built from
pub struct NodeParts {
    pub clock: Box<dyn Clock>,
    pub microphone: Box<dyn Microphone>,
    pub outputs: AlarmOutputs,
    pub lines: Box<dyn LineSource>,
    pub sink: Box<dyn FrameSink>,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub now_ms: u64,
    pub verdict: Option<(Verdict, VerdictOutcome)>,
    pub alert: TickOutcome,
    pub capture: Option<CycleOutcome>,
}

pub struct Node {
    scheduler: SchedulerConfig,
    clock: Box<dyn Clock>,
    microphone: Box<dyn Microphone>,
    capture: CaptureCycle,
    alarm: AlertFsm,
    outputs: AlarmOutputs,
    lines: Box<dyn LineSource>,
    sink: Box<dyn FrameSink>,
    last_segment_ms: u64,
    ticks: u64,
}

impl Node {
    /// Validate `config`, bring up the alarm and the microphone, and anchor
    /// the capture schedule at the current time.
    pub fn start(config: &NodeConfig, parts: NodeParts) -> Result<Self, NodeError> {
        config.validate().map_err(NodeError::Config)?;
        startup::log_banner();

        let NodeParts {
            clock,
            mut microphone,
            mut outputs,
            lines,
            sink,
        } = parts;

        let alarm = AlertFsm::new(config.alarm.clone())?;
        startup::bring_up_alarm(&alarm, &mut outputs);
        startup::bring_up_microphone(microphone.as_mut())?;

        info!(
            "System ready, recording every {} ms",
            config.scheduler.capture_interval_ms
        );

        let last_segment_ms = clock.now_ms();
        Ok(Self {
            scheduler: config.scheduler.clone(),
            clock,
            microphone,
            capture: CaptureCycle::new(&config.audio),
            alarm,
            outputs,
            lines,
            sink,
            last_segment_ms,
            ticks: 0,
        })
    }

    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;

        let verdict = self.ingest_verdict();

        let now_ms = self.clock.now_ms();
        let alert = self.alarm.tick(now_ms, &mut self.outputs);

        let capture = if now_ms.saturating_sub(self.last_segment_ms)
            >= self.scheduler.capture_interval_ms
        {
            let outcome = self
                .capture
                .run(self.microphone.as_mut(), self.sink.as_ref());
            self.last_segment_ms = self.clock.now_ms();
            debug!(
                "Next recording in {} ms",
                self.scheduler.capture_interval_ms
            );
            Some(outcome)
        } else {
            None
        };

        TickReport {
            now_ms,
            verdict,
            alert,
            capture,
        }
    }

    /// Tick forever with the configured delay between ticks
    pub fn run(&mut self) -> ! {
        let delay = Duration::from_millis(self.scheduler.tick_delay_ms);
        loop {
            self.tick();
            thread::sleep(delay);
        }
    }

    fn ingest_verdict(&mut self) -> Option<(Verdict, VerdictOutcome)> {
        let line = self.lines.poll_line()?;
        match decode_line(&line) {
            Some(verdict) => {
                let outcome = self
                    .alarm
                    .on_verdict(verdict, self.clock.now_ms(), &mut self.outputs);
                Some((verdict, outcome))
            }
            None => {
                trace!("Ignoring inbound line {:?}", line.trim_end());
                None
            }
        }
    }

    pub fn alarm(&self) -> &AlertFsm {
        &self.alarm
    }

    pub fn capture_stats(&self) -> &CaptureStats {
        self.capture.stats()
    }

    /// Time the last capture cycle finished (or start-up time)
    pub fn last_segment_ms(&self) -> u64 {
        self.last_segment_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
