//! Operator log lines for mode transitions and fault changes, emitted through defmt.

use menorah_core::fault::FaultCode;
use menorah_core::mode::{CandleEdge, ModeTransition};
use menorah_core::time::LocalTime;

use crate::board::{CANDLES, CandleWiring};

/// Logs a transition and, when candles lit or went out, the matching edge.
pub fn log_transition(transition: &ModeTransition) {
    emit_mode(transition.at, transition.state);
    match transition.candle_edge() {
        Some(CandleEdge::Lit { night }) => emit_candles_on(transition.at, night),
        Some(CandleEdge::Extinguished { previous_night }) => {
            emit_candles_off(transition.at, previous_night);
        }
        None => {}
    }
}

/// Logs the fault code the status task switched to.
pub fn log_fault(code: Option<FaultCode>) {
    match code {
        Some(code) => emit_fault(code.label(), code.blink_count(), code.is_fatal()),
        None => emit_fault_cleared(),
    }
}

pub fn log_startup(start: LocalTime, speed: u32) {
    defmt::info!(
        "menorah: {=usize} candles, clock {} x{=u32}",
        CANDLES.len(),
        defmt::Display2Format(&start),
        speed
    );
    for (index, wiring) in CANDLES.iter().enumerate() {
        log_wiring(index, wiring);
    }
}

fn log_wiring(index: usize, wiring: &CandleWiring) {
    defmt::info!(
        "menorah: candle {=usize} {} pin={} {} ch{=u8}",
        index,
        wiring.label,
        wiring.mcu_pin,
        wiring.timer.label(),
        wiring.channel
    );
}

fn emit_mode(at: Option<LocalTime>, state: i8) {
    match at {
        Some(at) => defmt::info!("[MODE] {} state={=i8}", defmt::Display2Format(&at), state),
        None => defmt::warn!("[MODE] time invalid state={=i8}", state),
    }
}

fn emit_candles_on(at: Option<LocalTime>, night: u8) {
    if let Some(at) = at {
        defmt::info!(
            "[CANDLES] ON  at {} (night {=u8})",
            defmt::Display2Format(&at),
            night
        );
    }
}

fn emit_candles_off(at: Option<LocalTime>, previous_night: u8) {
    match at {
        Some(at) => defmt::info!(
            "[CANDLES] OFF at {} (prev night {=u8})",
            defmt::Display2Format(&at),
            previous_night
        ),
        None => defmt::info!("[CANDLES] OFF (prev night {=u8})", previous_night),
    }
}

fn emit_fault(label: &'static str, blinks: u8, fatal: bool) {
    if fatal {
        defmt::error!("fault: {} ({=u8} blinks, all candles)", label, blinks);
    } else {
        defmt::warn!("fault: {} ({=u8} blinks)", label, blinks);
    }
}

fn emit_fault_cleared() {
    defmt::info!("fault: cleared");
}
