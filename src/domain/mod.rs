// Domain layer: records, filter configuration and the ports the pipeline talks to.

pub mod model;
pub mod ports;
