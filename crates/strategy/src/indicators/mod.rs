pub mod atr;
pub mod range;

pub use atr::AtrIndicator;
pub use range::RangeIndicator;
