// Library crate for BucketFS: re-export internal modules for reuse by external bins.
pub mod cadapter;
pub mod demo;
pub mod node;
pub mod session;
