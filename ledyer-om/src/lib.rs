//! Ledyer order management: order-line mapping and authenticated API calls.
//!
//! This crate maps an e-commerce order into Ledyer's order-line schema and submits
//! it to the Ledyer order-management API.
//!
//! - **Mapping** ([`mapper`]): merchandise, shipping, fees and coupons become order
//!   lines in integer minor units, rounded half-up at the currency's scale
//! - **Requests** ([`client`]): client-credentials token caching, `Idempotency-Key`
//!   headers, exponential backoff on transport failures and 5xx responses
//! - **Operations** ([`operations`]): edit order lines and capture, built on the two
//!   above
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   items, totals   ┌─────────────────┐
//! │  OrderStore  │──────────────────►│ OrderLineMapper │──► MappedOrder
//! │ (shop order) │◄── recalculate ───│  (+ line filter)│        │
//! └──────────────┘                   └─────────────────┘        │ payload
//!                                                               ▼
//!                  ┌──────────────┐  token   ┌──────────────────────────┐
//!                  │  TokenStore  │◄────────►│       LedyerClient       │
//!                  └──────────────┘          │ retry · log · parse JSON │
//!                                            └────────────┬─────────────┘
//!                                                         │ HttpTransport
//!                                                         ▼
//!                                                  Ledyer auth / API
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ledyer_om::{
//!     client::LedyerClient,
//!     mapper::OrderLineMapper,
//!     operations::capture_order,
//!     order::InMemoryOrder,
//!     settings::Settings,
//! };
//!
//! # async fn example() -> ledyer_om::Result<()> {
//! let settings = Settings::from_file("ledyer.toml")?;
//! let client = LedyerClient::new(settings.client_config(None)?)?;
//!
//! let mut order = InMemoryOrder::from_file("order.json")?;
//! let mapper = OrderLineMapper::new();
//!
//! let response = capture_order(&client, &mapper, &settings.endpoints, "or_2Nq", &mut order).await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, LedyerError>`. Transport failures and 5xx responses are
//! retried before they surface; 4xx responses and data errors surface immediately.
//!
//! # Logging
//!
//! The crate emits `tracing` events and spans. When logging is enabled in the
//! settings, every request attempt is also reported to a
//! [`RequestLogger`](client::RequestLogger), by default as events on the
//! `ledyer_om::requests` target.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and tokio"
)]

pub mod client;
pub mod error;
pub mod mapper;
pub mod money;
pub mod operations;
pub mod order;
pub mod reliability;
pub mod settings;

pub use error::{LedyerError, Result};
pub use mapper::OrderLineMapper;
