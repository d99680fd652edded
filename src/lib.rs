// src/lib.rs

//! assumap Library

pub mod cache;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod services;
pub mod utils;
