//! Alert state machine
//!
//! Evaluated once per super-loop tick. It never sleeps: every timing
//! decision is `now - activation timestamp`, with the clock reading supplied
//! by the caller.

use crate::config::AlarmConfig;
use crate::error::AlarmError;
use crate::outputs::AlarmOutputs;
use earwatch_core::Verdict;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    /// Alarm raised at `since_ms`
    Active { since_ms: u64 },
}

/// Effect of feeding one verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictOutcome {
    /// Idle -> Active
    Activated,
    /// ALERT while Active; timestamp untouched
    AlreadyActive,
    /// NORMAL while Idle; indicator set to the normal colour
    IndicatorNormal,
    /// NORMAL while Active; nothing changes
    NormalSuppressed,
}

/// Effect of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Outputs held off
    Idle,
    /// Alert in progress, outputs driven to `on`
    Pulsing { on: bool, elapsed_ms: u64 },
    /// Alert just ended; outputs off and indicator back to normal
    Expired { active_ms: u64 },
}

pub struct AlertFsm {
    config: AlarmConfig,
    state: AlertState,
    activations: u64,
}

impl AlertFsm {
    pub fn new(config: AlarmConfig) -> Result<Self, AlarmError> {
        config.validate().map_err(AlarmError::Config)?;
        Ok(Self {
            config,
            state: AlertState::Idle,
            activations: 0,
        })
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, AlertState::Active { .. })
    }

    /// Number of Idle -> Active transitions so far
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Put the outputs into their resting state
    pub fn bring_up(&self, outputs: &mut AlarmOutputs) {
        outputs.set_actuators(false);
        outputs.indicator.set_brightness(self.config.brightness);
        outputs.show_color(self.config.normal_color);
    }

    pub fn on_verdict(
        &mut self,
        verdict: Verdict,
        now_ms: u64,
        outputs: &mut AlarmOutputs,
    ) -> VerdictOutcome {
        match (verdict, self.state) {
            (Verdict::Alert, AlertState::Idle) => {
                self.state = AlertState::Active { since_ms: now_ms };
                self.activations += 1;
                outputs.show_color(self.config.alert_color);
                warn!(
                    "Classifier reported ALERT, alarm raised for {} ms",
                    self.config.alert_duration_ms
                );
                VerdictOutcome::Activated
            }
            (Verdict::Alert, AlertState::Active { .. }) => {
                info!("Alarm already active, duplicate ALERT ignored");
                VerdictOutcome::AlreadyActive
            }
            (Verdict::Normal, AlertState::Idle) => {
                info!("Classifier reported NORMAL");
                outputs.show_color(self.config.normal_color);
                VerdictOutcome::IndicatorNormal
            }
            (Verdict::Normal, AlertState::Active { .. }) => {
                debug!("NORMAL ignored while alarm is active");
                VerdictOutcome::NormalSuppressed
            }
        }
    }

    pub fn tick(&mut self, now_ms: u64, outputs: &mut AlarmOutputs) -> TickOutcome {
        let since_ms = match self.state {
            AlertState::Idle => {
                outputs.set_actuators(false);
                return TickOutcome::Idle;
            }
            AlertState::Active { since_ms } => since_ms,
        };

        let elapsed_ms = now_ms.saturating_sub(since_ms);
        if elapsed_ms < self.config.alert_duration_ms {
            let on = elapsed_ms % self.config.pulse_period_ms < self.config.pulse_on_ms;
            outputs.set_actuators(on);
            return TickOutcome::Pulsing { on, elapsed_ms };
        }

        outputs.set_actuators(false);
        self.state = AlertState::Idle;
        outputs.show_color(self.config.normal_color);
        info!("Alarm ended after {} ms, outputs off", elapsed_ms);
        TickOutcome::Expired {
            active_ms: elapsed_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{DigitalOutput, Rgb, RgbIndicator};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        level: Rc<RefCell<bool>>,
        color: Rc<RefCell<Option<Rgb>>>,
    }

    impl DigitalOutput for Recorder {
        fn set(&mut self, on: bool) {
            *self.level.borrow_mut() = on;
        }
    }

    impl RgbIndicator for Recorder {
        fn set_brightness(&mut self, _level: u8) {}

        fn set_color(&mut self, color: Rgb) {
            *self.color.borrow_mut() = Some(color);
        }

        fn show(&mut self) {}
    }

    fn outputs(recorder: &Recorder) -> AlarmOutputs {
        AlarmOutputs::new(
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
        )
    }

    #[test]
    fn test_idle_forces_outputs_off() {
        let recorder = Recorder::default();
        let mut outs = outputs(&recorder);
        *recorder.level.borrow_mut() = true;

        let mut fsm = AlertFsm::new(AlarmConfig::default()).unwrap();
        assert_eq!(fsm.tick(0, &mut outs), TickOutcome::Idle);
        assert!(!*recorder.level.borrow());
    }

    #[test]
    fn test_duplicate_alert_keeps_timestamp() {
        let recorder = Recorder::default();
        let mut outs = outputs(&recorder);
        let mut fsm = AlertFsm::new(AlarmConfig::default()).unwrap();

        assert_eq!(fsm.on_verdict(Verdict::Alert, 1000, &mut outs), VerdictOutcome::Activated);
        assert_eq!(fsm.on_verdict(Verdict::Alert, 1010, &mut outs), VerdictOutcome::AlreadyActive);
        assert_eq!(fsm.state(), AlertState::Active { since_ms: 1000 });
        assert_eq!(fsm.activations(), 1);
        assert_eq!(*recorder.color.borrow(), Some(Rgb::RED));
    }

    #[test]
    fn test_pulse_phase() {
        let recorder = Recorder::default();
        let mut outs = outputs(&recorder);
        let mut fsm = AlertFsm::new(AlarmConfig::default()).unwrap();
        fsm.on_verdict(Verdict::Alert, 500, &mut outs);

        for (now, on) in [(500, true), (599, true), (600, false), (699, false), (700, true)] {
            match fsm.tick(now, &mut outs) {
                TickOutcome::Pulsing { on: level, .. } => assert_eq!(level, on, "at {}", now),
                other => panic!("expected pulsing at {}, got {:?}", now, other),
            }
            assert_eq!(*recorder.level.borrow(), on);
        }
    }

    #[test]
    fn test_expiry_resets_indicator() {
        let recorder = Recorder::default();
        let mut outs = outputs(&recorder);
        let mut fsm = AlertFsm::new(AlarmConfig::default()).unwrap();
        fsm.on_verdict(Verdict::Alert, 0, &mut outs);
        fsm.tick(4999, &mut outs);

        assert_eq!(fsm.tick(5000, &mut outs), TickOutcome::Expired { active_ms: 5000 });
        assert_eq!(fsm.state(), AlertState::Idle);
        assert!(!*recorder.level.borrow());
        assert_eq!(*recorder.color.borrow(), Some(Rgb::GREEN));
        assert_eq!(fsm.tick(5100, &mut outs), TickOutcome::Idle);
    }

    #[test]
    fn test_normal_only_when_idle() {
        let recorder = Recorder::default();
        let mut outs = outputs(&recorder);
        let mut fsm = AlertFsm::new(AlarmConfig::default()).unwrap();

        assert_eq!(fsm.on_verdict(Verdict::Normal, 0, &mut outs), VerdictOutcome::IndicatorNormal);
        fsm.on_verdict(Verdict::Alert, 10, &mut outs);
        assert_eq!(fsm.on_verdict(Verdict::Normal, 20, &mut outs), VerdictOutcome::NormalSuppressed);
        assert_eq!(*recorder.color.borrow(), Some(Rgb::RED));
    }

    #[test]
    fn test_clock_behind_activation_does_not_underflow() {
        let recorder = Recorder::default();
        let mut outs = outputs(&recorder);
        let mut fsm = AlertFsm::new(AlarmConfig::default()).unwrap();
        fsm.on_verdict(Verdict::Alert, 1000, &mut outs);
        assert_eq!(
            fsm.tick(900, &mut outs),
            TickOutcome::Pulsing { on: true, elapsed_ms: 0 }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AlarmConfig {
            pulse_period_ms: 0,
            ..AlarmConfig::default()
        };
        assert!(AlertFsm::new(config).is_err());
    }
}
