//! Public status pages and the denormalized cache they are served from.

pub mod cache;

pub use cache::CacheMaterializer;
