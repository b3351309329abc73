pub mod memory;
pub mod rest;
pub mod traits;
pub mod types;

pub use memory::InMemoryBackend;
pub use rest::RestBackend;
pub use traits::ListingBackend;
pub use types::{FetchScope, ImageBlob, ImageChange};
