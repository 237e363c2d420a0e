//! Closed-set bus: the kind universe is fixed at bus-definition time.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::error::BusError;
use crate::message_set::{Kind, MessageSet};
use crate::queue::MessageQueue;
use crate::subscriber::Subscriber;

type SubscriberList<M> = Vec<Rc<dyn Fn(M)>>;

/// Publish/subscribe bus over a fixed, ordered set of message kinds.
///
/// The kind universe is the variant list of `M` (declared with
/// [`message_set!`](crate::message_set!)), so the subscriber table is a
/// plain vector pre-allocated with one slot per kind: subscription and
/// dispatch direct-index it by variant tag, and every kind has an entry by
/// construction. Adding a kind means redefining the message set; for
/// runtime-extensible kinds use [`RegistryBus`](crate::RegistryBus)
/// instead - both offer the same external contract.
///
/// Messages are delivered by value: each subscriber receives an independent
/// clone of the payload, so no callback observes another's mutation.
///
/// ## Example
///
/// ```
/// use kindbus::{message_set, ClosedBus};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// #[derive(Clone)]
/// struct Deposit { amount: u64 }
/// #[derive(Clone)]
/// struct Withdrawal { amount: u64 }
///
/// message_set! {
///     pub enum AccountMessage {
///         Deposit(Deposit),
///         Withdrawal(Withdrawal),
///     }
/// }
///
/// let bus: ClosedBus<AccountMessage> = ClosedBus::new();
/// let balance = Rc::new(RefCell::new(0i64));
///
/// let b = Rc::clone(&balance);
/// bus.subscribe(move |message: Deposit| *b.borrow_mut() += message.amount as i64);
/// let b = Rc::clone(&balance);
/// bus.subscribe(move |message: Withdrawal| *b.borrow_mut() -= message.amount as i64);
///
/// bus.send_message(Deposit { amount: 100 });
/// bus.send_message(Withdrawal { amount: 30 });
/// bus.drain().unwrap();
/// assert_eq!(*balance.borrow(), 70);
/// ```
pub struct ClosedBus<M: MessageSet> {
    table: RefCell<Vec<SubscriberList<M>>>,
    queue: RefCell<MessageQueue<M>>,
}

impl<M: MessageSet> Default for ClosedBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MessageSet> ClosedBus<M> {
    /// Create a bus with an empty subscriber list for every kind in `M`.
    pub fn new() -> Self {
        Self {
            table: RefCell::new((0..M::KIND_COUNT).map(|_| SubscriberList::new()).collect()),
            queue: RefCell::new(MessageQueue::new()),
        }
    }

    /// Create a bus and register each subscriber object against it.
    pub fn with_subscribers(subscribers: &[&dyn Subscriber<Self>]) -> Self {
        let bus = Self::new();
        bus.subscribe_all(subscribers);
        bus
    }

    /// Append `callback` to the subscriber list for kind `K`.
    ///
    /// Lists are append-only and keep registration order; registering the
    /// same callback twice means two deliveries per message.
    pub fn subscribe<K, F>(&self, callback: F)
    where
        K: Kind<M>,
        F: Fn(K) + 'static,
    {
        let erased: Rc<dyn Fn(M)> = Rc::new(move |message: M| {
            // The slot is indexed by K::INDEX, so extraction cannot miss.
            if let Some(payload) = K::extract(message) {
                callback(payload);
            }
        });
        self.table.borrow_mut()[K::INDEX].push(erased);
        debug!(slot = K::INDEX, "subscriber registered");
    }

    /// Invoke each object's self-registration hook with this bus.
    pub fn subscribe_all(&self, subscribers: &[&dyn Subscriber<Self>]) {
        for subscriber in subscribers {
            subscriber.register_with(self);
        }
    }

    /// Enqueue a message for a later dispatch step. Never delivers
    /// synchronously.
    pub fn send_message<K: Kind<M>>(&self, message: K) {
        let message = message.wrap();
        trace!(kind = message.kind_name(), "message queued");
        self.queue.borrow_mut().enqueue(message);
    }

    /// Dispatch the head-of-queue message to every subscriber of its kind,
    /// in registration order.
    ///
    /// Returns `Ok(false)` without side effect when the queue is empty.
    /// The callback list is snapshotted before delivery, so callbacks may
    /// re-enter the bus (`send_message`, `subscribe`) freely; subscribers
    /// added for the current kind are first considered for the next
    /// message.
    ///
    /// A message whose kind index has no table slot is a defect in the
    /// [`MessageSet`] impl; it is reported as
    /// [`BusError::UnknownKind`], never silently dropped.
    pub fn process_message(&self) -> Result<bool, BusError> {
        let message = match self.queue.borrow_mut().dequeue() {
            Some(message) => message,
            None => return Ok(false),
        };

        let callbacks = match self.table.borrow().get(message.kind_index()) {
            Some(list) => list.clone(),
            None => {
                error!(kind = message.kind_name(), "no table slot for message kind");
                return Err(BusError::UnknownKind {
                    kind: message.kind_name(),
                });
            }
        };

        trace!(
            kind = message.kind_name(),
            subscribers = callbacks.len(),
            "dispatching message"
        );
        for callback in &callbacks {
            callback(message.clone());
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
}
