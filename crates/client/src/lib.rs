//! # Partogram Client
//!
//! Client half of the timer sync protocol.
//!
//! The server owns timer truth; a view owns only a cache. Between polls the
//! cache ticks down locally once per second for visual smoothness, and every
//! successful poll overwrites it wholesale. Hidden views stop ticking and
//! (by default) stop polling; becoming visible again forces an immediate
//! reconciliation. A failed poll keeps the previous cache in place, so staff
//! see stale-but-reasonable numbers rather than an error-driven blank.
//!
//! One [`SyncHandle`](sync::SyncHandle) per mounted view; dropping it
//! cancels the tick and poll loops, so no timer outlives its view.

#![warn(rust_2018_idioms)]

pub mod source;
pub mod sync;
pub mod view;

pub use source::{HttpTimerSource, ObservedTimer, SyncError, TimerSource, ViewScope};
pub use sync::{SyncConfig, SyncHandle};
pub use view::{ViewTimers, ViewUpdate, Visibility};
