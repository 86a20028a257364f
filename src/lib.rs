pub mod code_type;
pub mod config;
pub mod dataset;
pub mod error;
pub mod example_db;
pub mod interrupt;
pub mod paths;
pub mod scrape;
pub mod transform;
pub mod translator;
pub mod walk;

// Re-export commonly used types
pub use code_type::{code_types_for, CodeType, Lang, LanguageModel};
pub use config::Config;
pub use dataset::ModelData;
pub use error::{Interrupted, ScrapeError};
pub use walk::{ExtractStats, Walker};
