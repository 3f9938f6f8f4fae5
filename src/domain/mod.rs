// Domain layer - Samples, bounded views and presentation state
pub mod chart;
pub mod dashboard;
pub mod history;
pub mod sample;
pub mod status;
pub mod window;
