pub mod availability;
pub mod compounds;
pub mod gridded;
pub mod record;
pub mod registry;
pub mod series;
pub mod site;
pub mod table;

pub use availability::{Availability, AvailabilityMatrix, AvailabilityMatrixBuilder};
pub use compounds::{final_compounds, CompoundMapping, COMPOUND_MAPPINGS};
pub use gridded::GriddedDataset;
pub use record::RawRecord;
pub use registry::{CodeEntry, CodeRegistry};
pub use series::{Coordinates, NormalizedSeries, Observation};
pub use site::{NamedSite, SiteId};
pub use table::MergedTable;
