pub mod constants;
pub mod dates;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use dates::{parse_yyyymmdd, to_yyyymmdd, DateRange};
pub use filename::generate_default_output_filename;
pub use logging::init_logging;
pub use progress::ProgressReporter;
