//! # Events Module
//!
//! Progress reporting decoupled from any particular front end.
//!
//! ## Design
//! The core library emits events through channels, allowing the CLI (or
//! anything else) to subscribe and display progress.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Identify(IdentifyEvent::Progress(p)) = event {
//!             println!("Identified {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
