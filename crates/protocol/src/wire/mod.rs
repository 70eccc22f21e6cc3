//! Record codecs and streaming readers/writers for both stream kinds.

pub mod delta;
pub mod signature;
