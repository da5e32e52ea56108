pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod machine;
pub mod run;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::*;
pub use event::MachineEvent;
pub use machine::*;
pub use run::*;
