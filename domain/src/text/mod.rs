//! Reply text shaping for the kernel console.
//!
//! The client prints replies on a VGA text buffer with a limited character
//! set and reads them with a blocking line reader, so every reply must be a
//! single line with accents stripped.

pub mod normalize;
pub mod wire;
