pub mod aligner;
pub mod availability_probe;
pub mod dataset_builder;
pub mod duplicate_resolver;
pub mod emissions;
pub mod integrity_checker;
pub mod normalizer;
pub mod regularizer;
pub mod resampler;
pub mod sector_aggregator;

pub use aligner::SeriesAligner;
pub use availability_probe::AvailabilityProbe;
pub use dataset_builder::{fetch_registry, BuildReport, DatasetBuilder};
pub use duplicate_resolver::{DuplicatePolicy, DuplicateResolver};
pub use emissions::EmissionsExtractor;
pub use integrity_checker::{ColumnCoverage, IntegrityChecker, IntegrityReport, TableViolation, ViolationType};
pub use normalizer::RecordNormalizer;
pub use regularizer::FrequencyRegularizer;
pub use resampler::Resampler;
pub use sector_aggregator::SectorAggregator;
