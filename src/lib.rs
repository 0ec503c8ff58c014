// Medicare Advantage Enrollment - Core Library
// Exposes the yearly pipeline for the CLI and tests

pub mod config;
pub mod error;
pub mod progress;
pub mod encoding;
pub mod loader;          // Record Loader
pub mod metadata;        // Metadata Consolidator
pub mod service_area;    // Service-Area Resolver
pub mod aggregate;       // Enrollment Aggregator
pub mod eligibility;     // Eligibility Filter & Joiner
pub mod tables;          // Table Generator
pub mod pipeline;
pub mod inspect;

// Re-export commonly used types
pub use config::{FileKind, PipelineConfig};
pub use error::PipelineError;
pub use progress::{ProgressEvent, ProgressSink, RecordingProgress, Stage, TracingProgress};
pub use encoding::{decode_with_fallback, Decoded, DecodingStrategy};
pub use loader::{load_enrollment, EnrollmentLoad, EnrollmentRecord, COLUMN_ALIASES};
pub use metadata::{consolidate_metadata, ContractMetadata, MetadataIndex, YesNo};
pub use service_area::{resolve_service_areas, ApprovedServiceAreas, ServiceAreaPair};
pub use aggregate::{coerce_enrollment, EnrollmentAggregator, YearlyPlanCounty, YearlyTotals};
pub use eligibility::{EligibilityFilter, EligibilityResult, ExclusionRule};
pub use tables::{SummaryTables, TypeAverage, TypeCount};
pub use pipeline::{compute, run_pipeline, PipelineReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
