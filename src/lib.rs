//! Cached clients for the Scryfall and 17Lands public APIs.
//!
//! Both providers are driven through one [`session::CachedSession`], which
//! wraps every GET in a disk-backed response cache, and each client reshapes
//! the provider's nested JSON into flat, column-stable records.
//!
//! ```rust,no_run
//! use draftdata::clients::scryfall::{ScryfallClient, SearchOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let scryfall = ScryfallClient::new()?;
//! let cards = scryfall
//!     .search_by_query("c:red pow:3", SearchOptions::default())
//!     .await?;
//! println!("{} cards", cards.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clients;
pub mod config;
pub mod constants;
pub mod reshape;
pub mod session;

pub use clients::scryfall::ScryfallClient;
pub use clients::seventeen_lands::SeventeenLandsClient;
pub use config::Config;
pub use session::{CachedSession, RawResponse, Transport};
