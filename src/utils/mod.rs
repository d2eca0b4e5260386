pub mod id;
mod lock;
pub mod time;

pub use lock::{read_lock, write_lock};
