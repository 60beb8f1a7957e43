//! # Event Bus Module
//!
//! Tagged-union events and a broadcast bus for decoupled notification of
//! leveling progress.
//!
//! There is no global instance: whoever owns a workflow creates a bus and
//! hands clones of its `Arc` to publishers and listeners.
//!
//! ```rust,ignore
//! use levelkit_core::event_bus::EventBus;
//!
//! let bus = Arc::new(EventBus::new());
//! let mut events = bus.receiver();
//! while let Ok(event) = events.recv().await {
//!     tracing::info!("{}", event.description());
//! }
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
