// Application layer: concrete pipelines wiring the core to storage and generators.

pub mod pipelines;
