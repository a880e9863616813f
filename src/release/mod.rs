//! Package version value and its persisted record

pub mod store;
pub mod version;

pub use store::VersionStore;
pub use version::Version;
