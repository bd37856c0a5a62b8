pub mod game_log;
pub mod progress;
pub mod season;

pub use game_log::*;
pub use progress::*;
pub use season::*;
