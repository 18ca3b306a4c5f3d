//! 저장소 모듈.

pub mod object_store;

pub use object_store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
