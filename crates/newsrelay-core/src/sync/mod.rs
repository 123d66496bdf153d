mod cursor;
mod cycle;
mod dispatcher;
mod error;
mod resolver;

pub use cursor::{Cursor, CursorStore};
pub use cycle::{CycleConfig, CycleReport, PollCycle, Preview};
pub use dispatcher::Dispatcher;
pub use error::CycleError;
pub use resolver::{resolve, MatchStrategy, Resolution};
