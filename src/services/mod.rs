pub mod analyzer;
pub mod encoding;
pub mod gemini;
pub mod openai_compat;
pub mod prompt;
pub mod report_writer;

pub use analyzer::{build_analyzer, parse_analysis_result, MediaAnalyzer};
pub use gemini::GeminiAnalyzer;
pub use openai_compat::OpenAiCompatAnalyzer;
pub use report_writer::ReportWriter;
