//! Mixcloud Client - HTTP access to the Mixcloud API
//!
//! This crate provides the client context behind the navigable wrappers
//! of `mixcloud-model`:
//!
//! - Resource retrieval, listings and search ([`Mixcloud`])
//! - Social actions (follow, favorite, repost, listen later)
//! - Embedding and oEmbed ([`DisplayOptions`])
//! - Cloudcast upload and edit ([`UploadParams`])
//! - OAuth authorization ([`MixcloudOAuth`])
//! - A blocking facade (`blocking` feature, on by default)
//!
//! # Example
//!
//! ```no_run
//! use mixcloud_client::{ClientConfig, Mixcloud};
//! use mixcloud_model::Pagination;
//!
//! # async fn example() -> mixcloud_client::Result<()> {
//! let client = Mixcloud::new(ClientConfig::default())?;
//! let page = client.popular(&Pagination::page(0)).await?;
//! if let Some(page) = page.as_collection() {
//!     for cloudcast in page.iter() {
//!         println!("{}", cloudcast);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod actions;
pub mod auth;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod client;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod operations;
pub mod upload;
pub mod urls;

pub use auth::MixcloudOAuth;
#[cfg(feature = "blocking")]
pub use blocking::{MixcloudOAuthSync, MixcloudSync};
pub use client::{GetOptions, Mixcloud, SearchType};
pub use config::{ClientConfig, UploadLimits};
pub use display::{DisplayOptions, EmbedFormat};
pub use error::{ApiError, ClientError, OAuthError, Result};
pub use operations::TargetedAction;
pub use upload::{EditOptions, UploadParams};
