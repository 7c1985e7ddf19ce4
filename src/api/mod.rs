//! REST dispatcher for OKX.
//!
//! The dispatcher executes [`Operation`](crate::shared::Operation)s built by
//! the endpoint wrappers in [`domain`](crate::domain). Each wrapper is a thin
//! method on [`OkxRestClient`]:
//!
//! ```rust,ignore
//! use okx_trade_sdk::prelude::*;
//!
//! let client = OkxRestClient::builder(DEFAULT_REST_URL)
//!     .credentials(Credentials::from_env()?)
//!     .demo_trading(true)
//!     .build()?;
//!
//! let open = client.get_open_orders(&OpenOrdersQuery::new()).await?;
//! ```
//!
//! # Error Handling
//!
//! All methods return `ApiResult<T>`. Exchange rejections keep their code:
//!
//! ```rust,ignore
//! match client.cancel_order(&request).await {
//!     Ok(reply) => println!("cancelled {}", reply.ord_id),
//!     Err(ApiError::Exchange { code, message }) => println!("{}: {}", code, message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

pub mod client;
pub mod error;

// Re-export main types for convenience
pub use client::{OkxRestClient, OkxRestClientBuilder};
pub use error::{ApiError, ApiResult};
