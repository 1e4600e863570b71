//! The single work-queue item type: both listeners, the timer, and the
//! shutdown signal all push onto one bounded FIFO channel.

use tsdb_core::Sample;

#[derive(Debug)]
pub enum Message {
    /// One UDP datagram or one TCP connection's full body, already parsed
    /// and validated — never a raw payload.
    SampleBatch(Vec<Sample>),
    Tick,
    Shutdown,
}
