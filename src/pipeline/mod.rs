pub mod assembler;
pub mod hook;
pub mod orchestrator;
pub mod report;

pub use assembler::ReportAssembler;
pub use hook::derive_hook;
pub use orchestrator::{SubmissionOutcome, handle_submission};
pub use report::{CompetitorEntry, DiagnosisReport, PrimarySummary};
