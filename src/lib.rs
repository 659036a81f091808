pub mod ai;
pub mod beneficiary;
pub mod dataset;
pub mod graph;
pub mod insights;
pub mod matching;
pub mod models;
pub mod scoring;
pub mod utils;
