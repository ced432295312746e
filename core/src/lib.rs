//! # Rule Builder Core
//!
//! Tree model and editing engines behind the visual rule builder.
//!
//! A rule is a tree of logical groups (AND / OR) whose ordered children are
//! filters (`field operator value`) and nested subgroups. The editor never
//! touches the tree directly: it sends commands and renders the read-only
//! projection that comes back.
//!
//! ## Example
//!
//! ```text
//! 1. Admins (AND)
//!    1.1 role equals admin
//!    1.2 Recent (OR)
//!        1.2.1 created is after 2024-01-01
//! 2. Guests (OR)
//! ```
//!
//! ## Modules
//!
//! - `store` - Entity store: groups, filters and top-level order
//! - `mutation` - Create / sub-create / edit commands
//! - `reorder` - Same-scope drag-and-drop moves
//! - `projection` - Display indices, cascaded block/pause, control gating
//! - `builder` - Single-writer session tying the above together
//! - `wasm` - WebAssembly bindings for JavaScript

mod builder;
mod config;
mod error;
mod events;
mod ids;
mod mutation;
mod projection;
mod reorder;
mod store;
mod types;
pub mod wasm;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use mutation::*;
pub use projection::*;
pub use reorder::*;
pub use store::*;
pub use types::*;
