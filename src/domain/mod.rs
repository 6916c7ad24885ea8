//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observation points and dataset stats (`Observation`, `DatasetStats`)
//! - model parameters (`ExpParams`)
//! - fit outputs (`CurveFit`, `FitQuality`, `Residual`)

pub mod types;

pub use types::*;
