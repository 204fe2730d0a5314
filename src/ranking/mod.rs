//! Ranking core: similarity, scoring, deduplication, diversity, pipeline.
//!
//! Scores results from many sources against a query, collapses records that
//! describe the same title, keeps any single source from dominating, and
//! returns the caller's records in ranked order.

pub mod dedup;
pub mod diversity;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod similarity;
pub mod source;
