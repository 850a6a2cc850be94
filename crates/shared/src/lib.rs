mod clock;
mod command;
mod date;
mod event;
pub mod user;

pub use clock::*;
pub use command::*;
pub use date::*;
pub use event::*;
