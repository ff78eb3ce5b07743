mod stats;

pub use stats::{mean, sample_std_dev};
