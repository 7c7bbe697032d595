pub mod aqs_client;
pub mod memory;
pub mod retry;
pub mod source;

pub use aqs_client::AqsClient;
pub use memory::InMemorySource;
pub use retry::RetryPolicy;
pub use source::{Endpoint, GriddedSource, RecordQuery, RecordSource};
