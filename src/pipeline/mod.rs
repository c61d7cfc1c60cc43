//! The extraction pipeline.
//!
//! Date windows come from `window`, each window x endpoint pair is fetched and
//! written by `extract`, and `normalize` tags rows with their window:
//! plan windows -> token -> stats -> normalize -> CSV append

pub mod extract;
pub mod normalize;
pub mod window;

pub use extract::*;
pub use normalize::*;
pub use window::*;
