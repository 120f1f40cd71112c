//! Exit-level arithmetic and result normalization.
//!
//! Every result that leaves the advisory engine passes through
//! [`normalize`], which guarantees usable stop-loss/take-profit levels
//! whenever the price is known.

pub mod levels;
pub mod normalize;

pub use levels::{round4, ExitLevels, ExitMultipliers};
pub use normalize::{normalize, truncate_chars, MAX_REASON_CHARS};
