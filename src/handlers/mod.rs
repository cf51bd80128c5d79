// handlers/mod.rs
//
// proxy  - catch-all relay under the API prefix
// system - root descriptor, health, fallback

pub mod proxy;
pub mod system;

pub use proxy::proxy;
pub use system::{health, not_found, root};
