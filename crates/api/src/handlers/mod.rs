pub mod charts;
pub mod models;
pub mod prediction;
pub mod training;
