mod queue;
mod shutdown;

pub use queue::{BroadcastQueue, Queue};
pub use shutdown::Shutdown;
