// Domain layer: query model, normalized records and the ports adapters implement.

pub mod intent;
pub mod model;
pub mod period;
pub mod ports;
