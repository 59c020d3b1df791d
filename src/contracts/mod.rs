//! Clients for the platform's deployed contracts.
//!
//! These sit on top of the generic pipelines in [`client`](crate::client):
//! each write is one build → sign → broadcast chain returning a
//! transaction id, and each derived read collapses failures into negative
//! results (see [`campus`] for why).

mod campus;
mod certificate;

pub use campus::Campus;
pub use certificate::Certificate;
