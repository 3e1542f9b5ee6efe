//! Application-level configuration.
//!
//! - [`DispatchParams`]: what every backend call carries and how long it may take

pub mod dispatch_params;

pub use dispatch_params::DispatchParams;
