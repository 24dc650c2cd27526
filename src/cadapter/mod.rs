//! Object store adapter (cAdapter)
//!
//! Submodules:
//! - `client`: backend trait and the cache-aware client used by node code
//! - `localfs`: local directory backend (mock object store)
//! - `memory`: in-memory backend for tests and local development
//! - `s3`: S3-compatible adapter implementation
//!
//! Responsibilities summary:
//! - Provide an async API for put/get/exists of node and extent blobs.
//! - Normalize error reporting into `StoreError`; retries/backoff live in
//!   the individual backends, never in the callers.
//! - Expose the cache-aware upload used for stable-identity metadata blobs.

pub mod client;
pub mod localfs;
pub mod memory;
pub mod s3;
