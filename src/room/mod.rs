pub mod manager;
pub mod player;
pub mod round;
pub mod session;

pub use manager::RoomManager;
pub use session::{Departure, Room};
