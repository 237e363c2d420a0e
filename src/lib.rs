//! kindbus - In-process publish/subscribe message bus
//!
//! Components register interest in specific message kinds, producers enqueue
//! messages, and a dispatch step later delivers each queued message
//! synchronously to every interested subscriber, in registration order.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Bus (two variants)                       │
//! │  subscribe() / subscribe_all() / send_message()             │
//! │  process_message() / drain()                                │
//! └─────────────────────────────────────────────────────────────┘
//!                │                              │
//!                ▼                              ▼
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │ ClosedBus<M: MessageSet>  │   │       RegistryBus         │
//! │ fixed kind set, table is  │   │ kinds registered at       │
//! │ an array indexed by       │   │ runtime, table keyed by   │
//! │ variant tag; exhaustive   │   │ TypeId; extensible, can   │
//! │ by construction           │   │ hit an unknown-kind fault │
//! └───────────────────────────┘   └───────────────────────────┘
//! ```
//!
//! Both variants honor the same contract: strict FIFO across kinds, fan-out
//! to every subscriber of a kind in registration order, and a hard
//! [`BusError::UnknownKind`] fault when a queued message's kind has no table
//! entry at all.
//!
//! ## Quick example
//!
//! ```
//! use kindbus::RegistryBus;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! struct OrderPlaced { id: u32 }
//!
//! let bus = RegistryBus::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = Rc::clone(&seen);
//! bus.subscribe(move |order: &OrderPlaced| log.borrow_mut().push(order.id));
//!
//! bus.send_message(OrderPlaced { id: 7 });
//! bus.send_message(OrderPlaced { id: 8 });
//!
//! // Nothing is delivered until the queue is drained.
//! assert!(seen.borrow().is_empty());
//! bus.drain().unwrap();
//! assert_eq!(*seen.borrow(), vec![7, 8]);
//! ```
//!
//! ## Request/response
//!
//! The [`Request`]/[`Requestor`]/[`Responder`] types layer a one-shot
//! request/response convention on top of the same queue: a request is an
//! ordinary message carrying an input and a single-shot reply callback, and
//! the responder answers synchronously inside the dispatch step that
//! delivered it. There is no blocking wait - the requester must keep
//! draining the queue for the reply to ever fire.
//!
//! ## Threading
//!
//! The bus is single-threaded by design: all operations are synchronous and
//! non-blocking, and a callback may itself call `send_message` or
//! `subscribe` on the bus that is dispatching it. Cross-thread delivery is
//! out of scope; wrap the bus externally if you need it.

mod closed_bus;
mod error;
mod message_set;
mod queue;
mod registry_bus;
mod request;
mod subscriber;

pub use closed_bus::ClosedBus;
pub use error::BusError;
pub use message_set::{Kind, MessageSet};
pub use queue::MessageQueue;
pub use registry_bus::RegistryBus;
pub use request::{Request, Requestor, Responder};
pub use subscriber::Subscriber;
