//! Research execution support.
//!
//! Research itself is not performed yet; [`progress`] produces the fixed
//! progress sequence clients render while a research run is "in flight".

pub mod progress;
