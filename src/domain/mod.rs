// Domain layer: chart vocabulary, entities, the oracle wire schema and the
// ports (interfaces) for the external calendar and star-placement engines.

pub mod ganzhi;
pub mod model;
pub mod ports;
pub mod raw;
