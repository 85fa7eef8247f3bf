//! Data access: the World Bank client, its transport seam and the dataset cache.

pub mod cache;
pub mod countries;
pub mod error;
pub mod transport;
pub mod worldbank;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CachePolicy, DatasetCache};
pub use countries::{CountryAtlas, CountryLocation};
pub use error::FetchError;
pub use transport::{HttpResponse, ReqwestTransport, Transport};
pub use worldbank::WorldBankClient;
