pub mod config;
pub mod error;
pub mod format;
pub mod probit;
pub mod qc;
pub mod stats;
pub mod summary;
pub mod timing;
