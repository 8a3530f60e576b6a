pub mod error;
pub mod lifecycle;
pub mod broadcast;
pub mod fanout;
pub mod coordinator;
pub mod service;

#[cfg(test)]
mod testing;

pub use error::{DispatchError, DispatchResult};
pub use lifecycle::BookingLifecycle;
pub use broadcast::BroadcastEngine;
pub use coordinator::{DeclineAck, ResponseCoordinator};
pub use service::{CreateInstantBooking, InstantBookingService, WidenOutcome};
