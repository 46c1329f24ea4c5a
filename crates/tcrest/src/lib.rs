//! tcrest - A lazy query client for the TeamCity REST API.
//!
//! Queries are built by chaining filters onto a [`QuerySet`]. Nothing is
//! fetched until data is needed; the first data access walks every page of
//! the list response (`nextHref`) and merges the pages into one result, which
//! later accesses reuse.
//!
//! # Features
//!
//! - `reqwest` (default) - Enables [`http::ReqwestTransport`] as the default
//!   transport. Without it a transport must be passed to
//!   [`TeamCityBuilder::transport`].
//!
//! # Example
//!
//! ```ignore
//! use tcrest::{TeamCity, resources::BuildFilter};
//!
//! let tc = TeamCity::builder("https://tc.example.com")
//!     .path_prefix("/guestAuth")
//!     .build()?;
//!
//! let mut builds = tc
//!     .builds()
//!     .all()
//!     .filter(BuildFilter::default().build_type("Foo_Package").branch("master"));
//!
//! println!("{} builds", builds.len().await?);
//! let latest = builds.nth(0).await?;
//! ```

pub mod error;
pub mod http;
pub mod locator;
pub mod manager;
pub mod pagination;
pub mod queryset;
pub mod resources;
pub mod session;

/// A raw JSON object as returned by the server.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub use error::{Error, Result};
pub use locator::{Locator, LocatorValue};
pub use manager::Manager;
pub use pagination::{ListSummary, MergePolicy, MergeSchema, MergedResult};
pub use queryset::{GetOptions, QuerySet};
pub use session::{TeamCity, TeamCityBuilder};
