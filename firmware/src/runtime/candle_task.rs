use super::CandleWorker;

#[embassy_executor::task(pool_size = crate::board::CANDLE_COUNT)]
pub async fn run(mut worker: CandleWorker) -> ! {
    worker.run().await
}
