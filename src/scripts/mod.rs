pub mod htlc;

pub use htlc::*;
