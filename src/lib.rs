//! Selective multicast dispatch for push-based event streams
//!
//! Routes one upstream source to many downstream consumers by a key computed
//! from each event, while keeping exactly one subscription to the upstream no
//! matter how many consumers there are.
//!
//! - Running a [`Dispatch`] subscribes to *every* event. Each one arrives as a
//!   [`Dispatched`]: the value plus a capability to open the view of any key.
//! - [`Dispatch::select`] (or [`Dispatched::select`]) gives a [`KeyView`], a
//!   source of only the events routed to that key.
//! - The upstream is started by the first registration and released by the
//!   disposal that leaves no registration behind.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use keyed_dispatch::prelude::*;
//! use keyed_dispatch::{DispatchError, Subject, Time, TokioClock};
//!
//! struct Print;
//!
//! impl Sink<(u32, i32)> for Print {
//!     fn event(&self, time: Time, (room, celsius): (u32, i32)) -> Result<(), DispatchError> {
//!         println!("{time}: room {room} is at {celsius}C");
//!         Ok(())
//!     }
//!     fn end(&self, _time: Time) -> Result<(), DispatchError> {
//!         Ok(())
//!     }
//!     fn error(&self, _time: Time, _err: keyed_dispatch::StreamError) -> Result<(), DispatchError> {
//!         Ok(())
//!     }
//! }
//!
//! let readings = Subject::<(u32, i32)>::new();
//! let rooms = readings.clone().dispatch_by(|(room, _): &(u32, i32)| *room);
//!
//! let kitchen = rooms.select(3).run(Arc::new(Print), &TokioClock::shared());
//! readings.event(0, (3, 21)).unwrap(); // printed
//! readings.event(1, (5, 19)).unwrap(); // not for room 3
//!
//! let _ = kitchen.dispose();
//! ```

pub mod dispatch;
pub mod error;
pub mod hub;
pub mod selector;
pub mod store;
pub mod stream;

pub use dispatch::{Dispatch, DispatchExt};
pub use error::{DispatchError, StreamError};
pub use hub::{
    Dispatched, DisposalHandle, FanoutPolicy, HubConfig, HubState, HubStats, KeyView, Select,
};
pub use selector::Selector;
pub use store::{HashStore, LinearStore, RouteKey, Subscriber, SubscriberStore};
pub use stream::{
    from_items, Disposable, Items, Pipe, Scheduler, Sink, Source, Subject, Teardown, Time,
    TokioClock,
};

pub mod prelude {
    //! Traits needed to run, subscribe and route streams.
    pub use crate::dispatch::DispatchExt;
    pub use crate::store::SubscriberStore;
    pub use crate::stream::{Disposable, Sink, Source};
}

#[cfg(test)]
pub(crate) mod testutil;
