mod attachment;
mod command;
mod error;
mod event;
mod gateway;
mod message;
mod role;
mod run;
mod session;

pub use attachment::*;
pub use command::*;
pub use error::*;
pub use event::*;
pub use gateway::*;
pub use message::*;
pub use role::*;
pub use run::*;
pub use session::*;
