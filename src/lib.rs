//! # CSV Ingest
//!
//! An HTTP API that ingests CSV uploads for three fixed record types
//! (departments, jobs, hired employees) into a Redshift warehouse.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────┐   ┌─────────┐   ┌──────────────┐
//! │  Upload  │──▶│ Chunk+Validate │──▶│ Stage   │──▶│ COPY per     │
//! │  (HTTP)  │   │ (1000 rows)    │   │ (S3)    │   │ object       │
//! └──────────┘   └────────────────┘   └─────────┘   └──────┬───────┘
//!                                          ▲               │ failure
//!                                          └── delete ◀────┘
//! ```
//!
//! Each upload is split into bounded chunks, every chunk is validated and
//! staged as its own object, then one bulk-copy statement per object loads
//! the data. If anything fails after the first object was staged, every
//! object staged by that upload is deleted (best-effort) before the error
//! is returned. Rows already committed by earlier copies are not rolled
//! back: callers should treat a load failure as an unknown partial state.
//!
//! Tables can also be exported to Parquet (`UNLOAD`) and reloaded.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`schema`] | Record types, columns and validators |
//! | [`chunk`] | Headerless CSV chunk reader and writer |
//! | [`validate`] | Row validation |
//! | [`storage`] | S3 client and in-memory object store |
//! | [`staging`] | Staged-object keys, put and batch delete |
//! | [`compensate`] | Cleanup after a failed upload |
//! | [`commands`] | COPY / UNLOAD statement rendering |
//! | [`warehouse`] | Warehouse connections |
//! | [`loader`] | Bulk loading |
//! | [`backup`] | Backup and restore |
//! | [`ingest`] | Upload pipeline |
//! | [`server`] | HTTP API |

pub mod backup;
pub mod check;
pub mod chunk;
pub mod commands;
pub mod compensate;
pub mod config;
pub mod context;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod schema;
pub mod server;
pub mod staging;
pub mod storage;
pub mod validate;
pub mod warehouse;
