// Status module - shared revocation status cache

pub mod cache;

pub use cache::StatusCache;
