pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod export;
pub mod raster;
pub mod review;
pub mod store;
