//! Credit-card fraud detection pipeline.
//!
//! Trains a binary fraud classifier from labeled transaction records and
//! serves per-transaction predictions from the resulting artifacts. The
//! pipeline covers preprocessing, stratified splitting, scaling, SMOTE
//! rebalancing, multi-candidate training with F1 selection, and the
//! model/scaler artifact contract shared by training and inference. Web
//! routing, authentication and user persistence are a caller's concern.

pub mod data;
pub mod engine;
pub mod models;
pub mod pipeline;
pub mod storage;
