pub mod clock;
pub mod formatting;

pub use clock::{Clock, SystemClock};
