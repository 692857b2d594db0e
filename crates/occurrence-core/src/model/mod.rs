mod analysis_type;
mod occurrence;

pub use analysis_type::AnalysisType;
pub use occurrence::Occurrence;
