//! Peripheral bring-up

use crate::error::NodeError;
use earwatch_alarm::{AlarmOutputs, AlertFsm};
use earwatch_core::AudioFormat;
use earwatch_sc::Microphone;
use tracing::{error, info};

const RULE: &str = "==================================================";

pub fn log_banner() {
    info!("{}", RULE);
    info!("EarWatch acoustic node v{}", env!("CARGO_PKG_VERSION"));
    info!("{}", RULE);
}

/// Outputs off, indicator at its configured brightness and normal colour
pub fn bring_up_alarm(alarm: &AlertFsm, outputs: &mut AlarmOutputs) {
    alarm.bring_up(outputs);
    info!(
        "Alarm outputs ready, indicator {}",
        alarm.config().normal_color
    );
}

/// Configure and start the microphone in the node's format.
///
/// Any failure here is fatal.
pub fn bring_up_microphone(microphone: &mut dyn Microphone) -> Result<(), NodeError> {
    let format = AudioFormat::NODE;
    info!(
        "Initializing microphone {} ({} Hz, {} bit, {} ch)",
        microphone.name(),
        format.sample_rate,
        format.bits_per_sample,
        format.channels
    );

    let result = microphone
        .configure(format)
        .and_then(|()| microphone.start());
    if let Err(e) = result {
        error!("Microphone {} failed to start: {}", microphone.name(), e);
        return Err(NodeError::PeripheralInit(format!(
            "microphone {}: {}",
            microphone.name(),
            e
        )));
    }

    info!("Microphone ready");
    Ok(())
}
