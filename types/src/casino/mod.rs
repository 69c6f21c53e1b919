//! Roulette domain types.
//!
//! Defines bet geometry, round/wheel state and player account state shared by the
//! execution layer and the live table service.

mod bet;
mod constants;
mod player;
mod round;
mod wheel;

pub use bet::*;
pub use constants::*;
pub use player::*;
pub use round::*;
pub use wheel::*;
