pub mod crop_materializer;
pub mod dataset_writer;
pub mod filler_planner;
pub mod labeled_exporter;
pub mod quota_allocator;

pub use crop_materializer::CropMaterializer;
pub use dataset_writer::DatasetWriter;
pub use filler_planner::FillerPlanner;
pub use labeled_exporter::{ExportStats, LabeledExporter};
pub use quota_allocator::{AllocationPlan, ProposalQuota, QuotaAllocator};
