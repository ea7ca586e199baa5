//! Domain layer: entities, value objects and the repository ports the
//! workflows depend on.

pub mod invoice;
pub mod party;
pub mod payment;
pub mod ports;
