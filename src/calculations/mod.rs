pub mod distribution;
pub mod grouping;
pub mod utilization;
pub mod windows;
