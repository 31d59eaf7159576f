pub mod config;
pub mod error;
pub mod load;
pub mod matcher;
pub mod recommend;
pub mod report;
pub mod respondent;
pub mod score;

pub use config::Config;
pub use error::LoadError;
pub use load::{load_datasets, Datasets};
pub use report::{Assessment, Report};
