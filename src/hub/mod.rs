//! Dispatch hub for keyed fan-out
//!
//! The hub holds the one upstream subscription shared by every downstream
//! consumer and routes each upstream event by its selector key.
//!
//! # Architecture
//!
//! ```text
//!                        upstream Source<T>
//!                               │  run() once per active period
//!                               ▼
//!                    ┌─────────────────────────┐
//!                    │ Hub                     │
//!                    │   selector: T -> K      │
//!                    │   store: key -> [subs]  │
//!                    │   subscription: Option  │
//!                    └───────────┬─────────────┘
//!                                │ event(t, x): key = selector(x)
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     wildcard subscribers                   subscribers of `key`
//!     Dispatched { x, select }               x
//! ```
//!
//! # Lifecycle
//!
//! The first registration of any kind starts the upstream; the disposal that
//! leaves the store empty releases it. In between the hub is
//! [`HubState::Active`] and never runs the upstream a second time.

mod core;
pub mod config;
pub mod disposal;
pub mod select;
pub mod state;

pub(crate) use self::core::{Hub, Registry};
pub use config::{FanoutPolicy, HubConfig};
pub use disposal::DisposalHandle;
pub use select::{Dispatched, KeyView, Select};
pub use state::{HubState, HubStats};
