//! Network incident log normalization and aggregation.
//!
//! Raw CSV rows become [`models::TypedRecord`]s through [`normalize`], the
//! [`analysis`] engine reduces them into grouped views, and [`format`] plus
//! [`report`] turn those views into tables and a text report.

pub mod analysis;
pub mod error;
pub mod format;
pub mod models;
pub mod normalize;
pub mod output;
pub mod parse;
pub mod report;
pub mod source;
