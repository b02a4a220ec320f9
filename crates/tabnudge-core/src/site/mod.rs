mod classifier;
pub mod hosts;

pub use classifier::{classify, Classification, SiteClassifier};
