//! Resumable, concurrent fetch-and-cache pipeline for paginated media catalogs.
//!
//! Leaves first: [`retry`], [`transport`], [`cache`], [`storage`] and
//! [`downloader`], [`queue`]. [`walker`] drives them against a [`walker::CatalogApi`];
//! [`catalog`] is the templated JSON implementation of that trait.

pub mod cache;
pub mod catalog;
pub mod checksum;
pub mod config;
pub mod context;
pub mod downloader;
pub mod ledger;
pub mod logging;
pub mod queue;
pub mod retry;
pub mod storage;
pub mod transport;
pub mod walker;

#[cfg(test)]
mod testing;
