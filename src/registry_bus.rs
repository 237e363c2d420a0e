//! Open-registry bus: message kinds are registered at runtime by type key.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::error::BusError;
use crate::queue::MessageQueue;
use crate::subscriber::Subscriber;

type ErasedCallback = Rc<dyn Fn(&dyn Any) -> Result<(), BusError>>;

/// Subscriber-table entry for one registered kind.
struct KindEntry {
    type_name: &'static str,
    callbacks: Vec<ErasedCallback>,
}

/// A queued message: its kind key plus the boxed value.
struct Envelope {
    key: TypeId,
    type_name: &'static str,
    payload: Box<dyn Any>,
}

/// Publish/subscribe bus whose kind universe grows at runtime.
///
/// Any `'static` type is a message kind; its [`TypeId`] is the kind key and
/// the subscriber table maps keys to type-erased callback lists. A table
/// entry is created lazily on first [`subscribe`](RegistryBus::subscribe)
/// (or explicitly with [`register`](RegistryBus::register)), so kinds can be
/// added without touching the bus definition - the trade against
/// [`ClosedBus`](crate::ClosedBus) is a hash lookup plus a checked downcast
/// per delivery, and a reachable [`BusError::UnknownKind`] fault when a
/// kind is sent before anything ever registered it.
///
/// Messages are delivered as `&M` views, one callback after another in
/// registration order.
///
/// ## Example
///
/// ```
/// use kindbus::RegistryBus;
///
/// struct Tick { frame: u64 }
///
/// let bus = RegistryBus::new();
/// bus.subscribe(|tick: &Tick| assert_eq!(tick.frame, 1));
/// bus.send_message(Tick { frame: 1 });
/// assert_eq!(bus.drain().unwrap(), 1);
/// ```
pub struct RegistryBus {
    table: RefCell<HashMap<TypeId, KindEntry>>,
    queue: RefCell<MessageQueue<Envelope>>,
}

impl Default for RegistryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBus {
    /// Create a bus with no registered kinds.
    pub fn new() -> Self {
        Self {
            table: RefCell::new(HashMap::new()),
            queue: RefCell::new(MessageQueue::new()),
        }
    }

    /// Create a bus and register each subscriber object against it.
    pub fn with_subscribers(subscribers: &[&dyn Subscriber<Self>]) -> Self {
        let bus = Self::new();
        bus.subscribe_all(subscribers);
        bus
    }

    /// Register kind `M` without subscribing anything.
    ///
    /// An entry that exists but is empty is not a fault: messages of that
    /// kind dispatch with zero fan-out instead of hitting
    /// [`BusError::UnknownKind`].
    pub fn register<M: Any>(&self) {
        self.table
            .borrow_mut()
            .entry(TypeId::of::<M>())
            .or_insert_with(|| KindEntry {
                type_name: type_name::<M>(),
                callbacks: Vec::new(),
            });
    }

    /// Append `callback` to the subscriber list for kind `M`, creating the
    /// table entry on first use.
    ///
    /// Lists are append-only and keep registration order; registering the
    /// same callback twice means two deliveries per message.
    pub fn subscribe<M, F>(&self, callback: F)
    where
        M: Any,
        F: Fn(&M) + 'static,
    {
        let erased: ErasedCallback = Rc::new(move |payload: &dyn Any| {
            let message = payload.downcast_ref::<M>().ok_or(BusError::KindMismatch {
                expected: type_name::<M>(),
            })?;
            callback(message);
            Ok(())
        });

        let mut table = self.table.borrow_mut();
        let entry = table
            .entry(TypeId::of::<M>())
            .or_insert_with(|| KindEntry {
                type_name: type_name::<M>(),
                callbacks: Vec::new(),
            });
        entry.callbacks.push(erased);
        debug!(kind = entry.type_name, "subscriber registered");
    }

    /// Invoke each object's self-registration hook with this bus.
    pub fn subscribe_all(&self, subscribers: &[&dyn Subscriber<Self>]) {
        for subscriber in subscribers {
            subscriber.register_with(self);
        }
    }

    /// Enqueue a message for a later dispatch step. Never delivers
    /// synchronously, and does not check whether the kind is registered -
    /// that check happens at dispatch.
    pub fn send_message<M: Any>(&self, message: M) {
        trace!(kind = type_name::<M>(), "message queued");
        self.queue.borrow_mut().enqueue(Envelope {
            key: TypeId::of::<M>(),
            type_name: type_name::<M>(),
            payload: Box::new(message),
        });
    }

    /// Dispatch the head-of-queue message to every subscriber of its kind,
    /// in registration order.
    ///
    /// Returns `Ok(false)` without side effect when the queue is empty.
    /// A kind with no table entry at all is fatal to this step: the fault
    /// is logged and returned as [`BusError::UnknownKind`], with the
    /// message consumed rather than silently dropped mid-queue.
    ///
    /// The callback list is snapshotted before delivery, so callbacks may
    /// re-enter the bus (`send_message`, `subscribe`) freely; subscribers
    /// added for the current kind are first considered for the next
    /// message.
    pub fn process_message(&self) -> Result<bool, BusError> {
        let envelope = match self.queue.borrow_mut().dequeue() {
            Some(envelope) => envelope,
            None => return Ok(false),
        };

        let callbacks = match self.table.borrow().get(&envelope.key) {
            Some(entry) => entry.callbacks.clone(),
            None => {
                error!(
                    kind = envelope.type_name,
                    "no registry entry for queued message kind"
                );
                return Err(BusError::UnknownKind {
                    kind: envelope.type_name,
                });
            }
        };

        trace!(
            kind = envelope.type_name,
            subscribers = callbacks.len(),
            "dispatching message"
        );
        for callback in &callbacks {
            callback(envelope.payload.as_ref())?;
        }
        Ok(true)
    }

    /// Dispatch until the queue is empty, including messages enqueued by
    /// callbacks during this drain. Returns the number of messages
    /// delivered; stops at the first dispatch fault.
    pub fn drain(&self) -> Result<usize, BusError> {
        let mut delivered = 0;
        while self.process_message()? {
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Number of messages awaiting dispatch.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether kind `M` has a table entry (empty or not).
    pub fn is_registered<M: Any>(&self) -> bool {
        self.table.borrow().contains_key(&TypeId::of::<M>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Ping;
    struct Pong(u32);

    type CallLog = Rc<RefCell<Vec<String>>>;

    fn record(log: &CallLog, entry: impl Into<String>) {
        log.borrow_mut().push(entry.into());
    }

    #[test]
    fn unknown_kind_is_a_fault_not_a_silent_drop() {
        let bus = RegistryBus::new();
        bus.send_message(Ping);

        let err = bus.process_message().unwrap_err();
        assert!(matches!(err, BusError::UnknownKind { .. }));
        // The faulting message was consumed; the queue is empty again.
        assert_eq!(bus.process_message(), Ok(false));
    }

    #[test]
    fn unknown_kind_aborts_the_drain() {
        let bus = RegistryBus::new();
        bus.subscribe(|_: &Pong| {});

        bus.send_message(Ping);
        bus.send_message(Pong(1));

        assert!(bus.drain().is_err());
        // The message queued behind the fault is still pending.
        assert_eq!(bus.pending(), 1);
        assert_eq!(bus.drain(), Ok(1));
    }

    #[test]
    fn registered_kind_with_no_subscribers_dispatches_with_zero_fan_out() {
        let bus = RegistryBus::new();
        bus.register::<Ping>();
        assert!(bus.is_registered::<Ping>());

        bus.send_message(Ping);
        assert_eq!(bus.process_message(), Ok(true));
    }

    #[test]
    fn entry_is_created_lazily_on_first_subscribe() {
        let bus = RegistryBus::new();
        assert!(!bus.is_registered::<Ping>());
        bus.subscribe(|_: &Ping| {});
        assert!(bus.is_registered::<Ping>());
    }

    #[test]
    fn fan_out_in_registration_order() {
        let bus = RegistryBus::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        bus.subscribe(move |_: &Ping| record(&l, "first"));
        let l = Rc::clone(&log);
        bus.subscribe(move |_: &Ping| record(&l, "second"));

        bus.send_message(Ping);
        bus.drain().unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn fifo_across_kinds() {
        let bus = RegistryBus::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        bus.subscribe(move |_: &Ping| record(&l, "ping"));
        let l = Rc::clone(&log);
        bus.subscribe(move |message: &Pong| record(&l, format!("pong-{}", message.0)));

        bus.send_message(Pong(1));
        bus.send_message(Ping);
        bus.send_message(Pong(2));

        assert_eq!(bus.drain(), Ok(3));
        assert_eq!(*log.borrow(), vec!["pong-1", "ping", "pong-2"]);
    }

    #[test]
    fn empty_queue_is_idempotent() {
        let bus = RegistryBus::new();
        assert_eq!(bus.process_message(), Ok(false));
        assert_eq!(bus.process_message(), Ok(false));
        assert_eq!(bus.drain(), Ok(0));
    }

    #[test]
    fn reentrant_send_lands_at_the_tail() {
        let bus = Rc::new(RegistryBus::new());
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let b = Rc::clone(&bus);
        bus.subscribe(move |_: &Ping| {
            record(&l, "ping");
            b.send_message(Pong(9));
        });
        let l = Rc::clone(&log);
        bus.subscribe(move |message: &Pong| record(&l, format!("pong-{}", message.0)));

        bus.send_message(Ping);
        bus.send_message(Pong(1));

        assert_eq!(bus.drain(), Ok(3));
        assert_eq!(*log.borrow(), vec!["ping", "pong-1", "pong-9"]);
    }

    #[test]
    fn subscribe_during_dispatch_skips_current_message() {
        let bus = Rc::new(RegistryBus::new());
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let b = Rc::clone(&bus);
        bus.subscribe(move |_: &Ping| {
            record(&l, "original");
            let inner = Rc::clone(&l);
            b.subscribe(move |_: &Ping| record(&inner, "late"));
        });

        bus.send_message(Ping);
        bus.send_message(Ping);
        bus.drain().unwrap();

        assert_eq!(*log.borrow(), vec!["original", "original", "late"]);
    }

    #[test]
    fn message_outlives_the_sender_frame() {
        let bus = RegistryBus::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        bus.subscribe(move |message: &Pong| record(&l, format!("pong-{}", message.0)));

        {
            let local = Pong(5);
            bus.send_message(local);
        }

        bus.drain().unwrap();
        assert_eq!(*log.borrow(), vec!["pong-5"]);
    }
}
