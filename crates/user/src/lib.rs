mod account;
mod catalog;
mod command;
mod error;
mod grant;
mod resolver;
mod scheduler;
mod snapshot;
mod sql;
mod store;
mod subscription;
mod sweep;
mod trial;
mod types;

pub use account::*;
pub use command::*;
pub use error::*;
pub use grant::*;
pub use resolver::{Evaluation, evaluate, resolve_base, tool_set};
pub use scheduler::scheduler;
pub use sql::SqliteStore;
pub use store::*;
pub use subscription::*;
pub use sweep::*;
pub use trial::*;
pub use types::*;
