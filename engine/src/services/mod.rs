// Service layer: orchestration on top of the data, indicator and notification modules
pub mod analysis_service;

pub use analysis_service::{AnalysisService, CycleReport};
