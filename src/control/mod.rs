//! Run control: time source and cancellation.

pub mod clock;
pub mod signals;
