pub mod credentials;
pub mod error;
pub mod finnhub;
pub mod relevance;

pub use credentials::ApiCredential;
pub use error::{NewsApiError, Result};
pub use finnhub::{select_items, FinnhubClient, FinnhubConfig};
pub use relevance::is_currency_related;
