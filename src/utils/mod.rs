//! Utility modules shared by the registry clients.
//!
//! - [`HttpClient`]: reqwest wrapper with a fixed per-request timeout and a
//!   courtesy pause after every round trip
//!
//! # HTTP Client
//!
//! ```rust,no_run
//! use refaudit::utils::HttpClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let body: serde_json::Value = client
//!     .get_json("https://api.crossref.org/works", &[("rows", "1".to_string())])
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod http;

pub use http::HttpClient;
