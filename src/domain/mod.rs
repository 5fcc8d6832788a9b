//! Domain layer: value objects of the quote and payment pipeline and the
//! ports through which the application talks to the outside world.

pub mod booking;
pub mod insurance;
pub mod order;
pub mod payment;
pub mod ports;
pub mod quote;
pub mod zone;
