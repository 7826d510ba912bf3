pub mod config;
pub mod language;
pub mod report;
pub mod submission;
pub mod submission_status;
pub mod test_case;
pub mod verdict;

pub use language::Language;
pub use submission_status::SubmissionStatus;
pub use verdict::Verdict;
