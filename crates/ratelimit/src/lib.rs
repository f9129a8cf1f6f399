//! Dispatch control for batch order submission
//!
//! - `DispatchGate`: bounds how many submissions are in flight at once and
//!   stops admitting work once closed
//! - `Pacer`: cancellable pause between consecutive submissions

pub mod gate;
pub mod pacer;

pub use gate::{DispatchError, DispatchGate, DispatchPermit};
pub use pacer::{Pace, Pacer};
