//! Rental session lifecycle.

pub mod expiry;
pub mod request;
pub mod service;

#[cfg(test)]
mod tests;

pub use request::{
    CostPreview, ExpirySummary, StartSessionRequest, StopSessionRequest, StoppedSession,
};
pub use service::RentalSessionService;
