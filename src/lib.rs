//! Identity reconciliation dashboard: derives the primary/secondary contact
//! graph from backend snapshots, talks to the reconciliation API and follows
//! its push channel.

pub mod api;
pub mod app;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod feed;
pub mod form;
pub mod graph;
pub mod push;
pub mod render;

pub type Result<T> = anyhow::Result<T>;
