//! # Endee client
//!
//! HTTP access to an Endee deployment: index management plus [`Index`]
//! handles that run the batched upsert and query pipeline.
//!
//! ```no_run
//! use client::{ClientConfig, CreateIndexOptions, Endee};
//! use vector::{SpaceType, VectorRecord};
//! use pipeline::CancellationToken;
//!
//! # async fn run() -> Result<(), client::ClientError> {
//! let endee = Endee::new(ClientConfig::default())?;
//! endee
//!     .create_index("docs", 4, SpaceType::Cosine, &CreateIndexOptions::default())
//!     .await?;
//!
//! let index = endee.get_index("docs").await?;
//! let records = vec![VectorRecord::new("a", vec![1.0, 0.0, 0.0, 0.0])];
//! index.upsert(records, &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod error;
pub mod http;
mod models;

pub use crate::client::{parse_space_type, validate_index_name, Endee};
pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, ClientResult};
pub use crate::http::HttpTransport;
pub use crate::models::{CreateIndexOptions, IndexInfo};

pub use pipeline::Index;
