// Domain layer: batch records and the ports (interfaces) the pipeline talks through.

pub mod model;
pub mod ports;
