pub mod classifier;
pub mod labels;
pub mod manager;
pub mod predictor;

pub use classifier::Classifier;
pub use labels::{CLASS_NAMES, NUM_CLASSES};
pub use manager::{ModelManager, ModelStats};
pub use predictor::Predictor;
