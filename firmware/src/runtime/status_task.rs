use super::BoardFaultSignal;
use crate::hw::EmbassyPause;
use crate::trace;

#[embassy_executor::task]
pub async fn run(signal: BoardFaultSignal) -> ! {
    let mut pause = EmbassyPause;
    let mut shown = None;
    loop {
        let code = signal.tick(&mut pause).await;
        if code != shown {
            trace::log_fault(code);
            shown = code;
        }
    }
}
