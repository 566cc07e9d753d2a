//! Keyed fan-out demo - splits one stream of sensor readings by room
//!
//! Run with: cargo run --example keyed_fanout -- [period_ms]
//!
//! This demo shows:
//! - Routing a timed source with `dispatch_by`
//! - Opening a per-room view the first time a room shows up, from inside the
//!   wildcard consumer, using the capability carried by each event
//! - Every view sharing the one upstream subscription
//!
//! Set `RUST_LOG=keyed_dispatch=trace` to see the hub's lifecycle.
//!
//! # Flow
//!
//! ```text
//!   from_items(readings) ──> Dispatch (by room)
//!                                 │
//!                 ┌───────────────┼─────────────────┐
//!                 ▼               ▼                 ▼
//!             Watcher         room 3 log        room 5 log ...
//!        (opens room logs)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyed_dispatch::prelude::*;
use keyed_dispatch::{
    from_items, Dispatched, DispatchError, Scheduler, StreamError, Time, TokioClock,
};
use tokio::sync::watch;

#[derive(Debug, Clone)]
struct Reading {
    room: u32,
    celsius: i32,
}

/// Prints the readings of one room
struct RoomLog {
    room: u32,
    first: i32,
}

impl Sink<Reading> for RoomLog {
    fn event(&self, time: Time, reading: Reading) -> Result<(), DispatchError> {
        println!(
            "[{:>4}ms] room {:>2}: {:>3}C (first seen at {}C)",
            time, self.room, reading.celsius, self.first
        );
        Ok(())
    }

    fn end(&self, time: Time) -> Result<(), DispatchError> {
        println!("[{:>4}ms] room {:>2}: done", time, self.room);
        Ok(())
    }

    fn error(&self, _time: Time, err: StreamError) -> Result<(), DispatchError> {
        eprintln!("room {}: {}", self.room, err);
        Ok(())
    }
}

/// Sees every reading and opens a room log on first sight
struct Watcher {
    clock: Arc<dyn Scheduler>,
    rooms: Mutex<HashMap<u32, Box<dyn Disposable>>>,
    done: watch::Sender<bool>,
}

impl Sink<Dispatched<Reading, u32>> for Watcher {
    fn event(&self, _time: Time, dispatched: Dispatched<Reading, u32>) -> Result<(), DispatchError> {
        let Reading { room, celsius } = dispatched.value().clone();
        let mut rooms = self
            .rooms
            .lock()
            .map_err(|_| DispatchError::Rejected("room table poisoned".into()))?;
        if !rooms.contains_key(&room) {
            println!("new room {}", room);
            let log = Arc::new(RoomLog {
                room,
                first: celsius,
            });
            rooms.insert(room, dispatched.select(room).run(log, &self.clock));
        }
        Ok(())
    }

    fn end(&self, _time: Time) -> Result<(), DispatchError> {
        let _ = self.done.send(true);
        Ok(())
    }

    fn error(&self, _time: Time, err: StreamError) -> Result<(), DispatchError> {
        eprintln!("upstream failed: {}", err);
        let _ = self.done.send(true);
        Ok(())
    }
}

fn readings() -> Vec<Reading> {
    [(3, 21), (5, 19), (7, 23), (5, 18), (3, 22), (3, 22), (5, 17)]
        .into_iter()
        .map(|(room, celsius)| Reading { room, celsius })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let period = match std::env::args().nth(1) {
        Some(ms) => Duration::from_millis(ms.parse()?),
        None => Duration::from_millis(100),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("keyed_dispatch=debug".parse()?),
        )
        .init();

    let clock = TokioClock::shared();
    let rooms = from_items(readings(), period).dispatch_by(|r: &Reading| r.room);

    let (done, mut finished) = watch::channel(false);
    let watcher = Arc::new(Watcher {
        clock: Arc::clone(&clock),
        rooms: Mutex::new(HashMap::new()),
        done,
    });
    let all = rooms.run(watcher.clone(), &clock);

    finished.wait_for(|done| *done).await?;

    let stats = rooms.stats();
    println!();
    println!(
        "{} subscribers over {} keys, {} events, upstream started {} time(s)",
        stats.subscribers, stats.keys, stats.events, stats.upstream_runs
    );

    let views: Vec<_> = match watcher.rooms.lock() {
        Ok(mut rooms) => rooms.drain().map(|(_, view)| view).collect(),
        Err(_) => Vec::new(),
    };
    for view in views {
        view.dispose().await?;
    }
    all.dispose().await?;

    println!("hub is {:?}", rooms.state());
    Ok(())
}
