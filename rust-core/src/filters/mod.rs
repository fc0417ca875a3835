//! Window functions used for kernel design and perceptual band weighting

pub mod weighting;
pub mod windows;

pub use weighting::{dba_weight, dba_weights};
pub use windows::{WindowType, create_full_window};
