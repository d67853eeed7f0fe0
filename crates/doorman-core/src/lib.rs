//! Core of the Doorman admin console.
//!
//! A typed client for the Doorman gateway's management API and the view
//! state machines the console is built from. The five resource families
//! (APIs, routings, users, groups, roles) share one generic implementation:
//! each record type implements [`Entity`] and gets a [`ListView`],
//! [`DetailView`] and [`CreateView`] for free.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use doorman_core::{ConsoleConfig, ListView, MemoryStore, ResourceClient, Session};
//! use doorman_core::models::Group;
//!
//! # async fn example() -> doorman_core::Result<()> {
//! let config = ConsoleConfig::load()?;
//! let session = Session::open(&config, Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new())).await?;
//! session.login("admin@example.com", "Correct-Horse-42!Battery").await?;
//!
//! let groups = ResourceClient::<Group>::new(session.client());
//! let mut view = ListView::new(config.page_size);
//! view.load(&groups).await?;
//! view.search("ops");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod create;
pub mod dashboard;
pub mod detail;
pub mod draft;
pub mod entity;
pub mod error;
pub mod list;
pub mod logs;
pub mod metrics;
pub mod models;
pub mod password;
pub mod route;
pub mod session;
pub mod settings;
pub mod store;

#[cfg(test)]
mod testing;

pub use cache::SelectionCache;
pub use client::{ResourceApi, ResourceClient};
pub use config::{ConsoleConfig, Theme};
pub use create::CreateView;
pub use detail::{DetailState, DetailView};
pub use draft::Draft;
pub use entity::{Entity, EntityKind, FieldKind, FieldSpec, SortKey};
pub use error::{ConsoleError, Result};
pub use list::{ListState, ListView};
pub use route::Route;
pub use session::{ConsoleClient, Credential, Session};
pub use store::{FileStore, KeyValueStore, MemoryStore};
