//! External system integrations.
//!
//! - [`nightscout`] - Nightscout REST API source
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The core pipeline only sees the
//! [`RecordSource`](crate::core::fetch::RecordSource) trait; HTTP types never
//! leave this module.
//!
//! ```rust,no_run
//! use nightscout_export::adapters::nightscout::{normalize_url, NightscoutClient};
//! use nightscout_export::config::SourceConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SourceConfig::default();
//! let base_url = normalize_url("my-site.herokuapp.com", &config).await?;
//! let client = NightscoutClient::new(base_url, &config)?;
//! # Ok(())
//! # }
//! ```

pub mod nightscout;
