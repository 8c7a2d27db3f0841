mod subscriber;

pub use subscriber::{init_tracing, init_tracing_with_level};
