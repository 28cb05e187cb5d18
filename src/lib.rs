// src/lib.rs

//! orobnat: drinking-water quality report downloader library

pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
