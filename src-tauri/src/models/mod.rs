pub mod lenient;
pub mod log;
pub mod profile;
pub mod settings;
pub mod version;

pub use log::{LogEntry, LogKind, NewLogEntry};
pub use profile::{Answers, Profile};
pub use settings::Settings;
pub use version::PlanVersion;
