pub mod cache;
pub mod error;
pub mod fetch;
pub mod key;
pub mod notify;
pub mod remap;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{EntryState, ResourceCache};
pub use error::FetchError;
pub use fetch::RetryPolicy;
pub use notify::NotificationHub;
pub use store::AssetStore;
