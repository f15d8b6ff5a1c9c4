//! Representación normalizada de una release y su orden de ejecución.
pub mod cache;
pub mod normalize;
pub mod order;

pub use cache::ReleaseCache;
pub use normalize::{normalize_release, NormalizedRelease, NormalizedStep};
pub use order::next_step;
