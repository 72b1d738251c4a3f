//! Rental session entity, status enumerations, and transition payloads.

pub mod model;
pub mod status;
pub mod transition;

pub use model::{NewRentalSession, RentalSession, SessionFilter};
pub use status::{PaymentType, SessionStatus};
pub use transition::{ClosedSession, SessionClosure};
