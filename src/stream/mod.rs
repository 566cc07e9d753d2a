//! Host stream abstraction
//!
//! The minimal push-based stream contract the dispatch hub plugs into:
//!
//! - a [`Sink`] receives `event`, `end` and `error` notifications
//! - a [`Source`] is started with [`Source::run`], which hands back a
//!   [`Disposable`] subscription
//! - disposing yields a [`Teardown`], the deferred completion of releasing
//!   whatever the subscription held
//!
//! [`Subject`] and [`from_items`] are ready-made sources for driving a hub by
//! hand or from a tokio task.

pub mod items;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod subject;

pub use items::{from_items, Items};
pub use scheduler::{Scheduler, TokioClock};
pub use sink::{Pipe, Sink};
pub use source::{Disposable, Source, Teardown};
pub use subject::Subject;

/// Stream time in milliseconds
pub type Time = u64;
