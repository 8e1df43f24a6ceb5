pub mod detector_runner;
pub mod temp_registry;

pub use detector_runner::{
    ProcessDetectors, RegionDetectors, SaliencyRun, PROPOSAL_META_FILE, SALIENCY_META_FILE,
};
pub use temp_registry::TempRegistry;
