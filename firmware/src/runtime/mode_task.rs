use embassy_time::Timer;

use super::BoardModeLoop;
use crate::hw::core_duration_to_embassy;
use crate::trace;

#[embassy_executor::task]
pub async fn run(mut mode_loop: BoardModeLoop) -> ! {
    loop {
        if let Some(transition) = mode_loop.poll().await {
            trace::log_transition(&transition);
        }
        Timer::after(core_duration_to_embassy(mode_loop.poll_interval())).await;
    }
}
