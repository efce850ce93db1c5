mod storages;
mod timings;

pub use storages::*;
pub use timings::*;
