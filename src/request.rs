//! One-shot request/response layered on the pub/sub contract.
//!
//! A [`Request`] is an ordinary message: it rides the same queue and is
//! dispatched like any other kind. What makes it a request is its payload -
//! a domain input plus a single-shot reply callback - and the convention
//! that its subscriber (the responder) invokes that callback while handling
//! it. This is not a blocking call: the requester enqueues the request and
//! must keep draining the dispatch loop for the reply ever to fire.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::closed_bus::ClosedBus;
use crate::error::BusError;
use crate::message_set::{Kind, MessageSet};
use crate::registry_bus::RegistryBus;
use crate::subscriber::Subscriber;

type ReplyFn<R> = Box<dyn FnOnce(R)>;

/// A message carrying a domain input and a single-shot reply callback.
///
/// The reply slot is shared across clones (cloning is what lets a request
/// be a [`ClosedBus`] enum payload), so however many copies dispatch makes,
/// the callback still fires at most once; a second
/// [`respond`](Request::respond) gets [`BusError::ReplyConsumed`]. If
/// several responders subscribe to the same request kind, only the first
/// one to respond wins - the bus still fans out to all of them, and
/// arbitrating that is the caller's business.
pub struct Request<I, R> {
    input: I,
    reply: Rc<RefCell<Option<ReplyFn<R>>>>,
}

impl<I, R> Request<I, R> {
    /// Build a request around `input`; `reply` is invoked with the result
    /// when a responder answers.
    pub fn new<F>(input: I, reply: F) -> Self
    where
        F: FnOnce(R) + 'static,
    {
        Self {
            input,
            reply: Rc::new(RefCell::new(Some(Box::new(reply)))),
        }
    }

    /// The domain input this request carries.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Whether the reply callback has already been invoked.
    pub fn responded(&self) -> bool {
        self.reply.borrow().is_none()
    }

    /// Invoke the reply callback with `result`, consuming it.
    pub fn respond(&self, result: R) -> Result<(), BusError> {
        let reply = self.reply.borrow_mut().take();
        match reply {
            Some(reply) => {
                reply(result);
                Ok(())
            }
            None => Err(BusError::ReplyConsumed),
        }
    }
}

impl<I: Clone, R> Clone for Request<I, R> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            reply: Rc::clone(&self.reply),
        }
    }
}

impl<I: fmt::Debug, R> fmt::Debug for Request<I, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("input", &self.input)
            .field("responded", &self.responded())
            .finish()
    }
}

/// A component that answers requests of one kind synchronously.
///
/// The responder side of the extension: `action` is the whole contract,
/// and [`Responder`] does the bus wiring.
pub trait Requestor {
    /// Domain input carried by the request.
    type Input;
    /// Result handed to the request's reply callback.
    type Output;

    /// Compute the result for one request.
    fn action(&self, input: &Self::Input) -> Self::Output;
}

/// Subscribes a [`Requestor`] to its request kind on either bus variant.
///
/// On delivery it runs [`Requestor::action`] and responds inside the same
/// dispatch step. A reply slot that was already consumed (an extra
/// responder answered first) is logged and dropped, not treated as a
/// dispatch fault.
///
/// ```
/// use kindbus::{RegistryBus, Request, Requestor, Responder};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// struct Parser;
///
/// impl Requestor for Parser {
///     type Input = String;
///     type Output = i64;
///
///     fn action(&self, input: &String) -> i64 {
///         input.parse().unwrap_or(0)
///     }
/// }
///
/// let responder = Responder::new(Parser);
/// let bus = RegistryBus::with_subscribers(&[&responder]);
///
/// let result: Rc<RefCell<Option<i64>>> = Rc::new(RefCell::new(None));
/// let slot = Rc::clone(&result);
/// bus.send_message(Request::new("5".to_string(), move |n| *slot.borrow_mut() = Some(n)));
///
/// bus.drain().unwrap();
/// assert_eq!(*result.borrow(), Some(5));
/// ```
pub struct Responder<Q> {
    requestor: Rc<Q>,
}

impl<Q> Responder<Q> {
    /// Wrap a requestor for registration.
    pub fn new(requestor: Q) -> Self {
        Self {
            requestor: Rc::new(requestor),
        }
    }

    /// Wrap an already-shared requestor.
    pub fn from_rc(requestor: Rc<Q>) -> Self {
        Self { requestor }
    }
}

impl<Q> Subscriber<RegistryBus> for Responder<Q>
where
    Q: Requestor + 'static,
    Q::Input: 'static,
    Q::Output: 'static,
{
    fn register_with(&self, bus: &RegistryBus) {
        let requestor = Rc::clone(&self.requestor);
        bus.subscribe(move |request: &Request<Q::Input, Q::Output>| {
            let output = requestor.action(request.input());
            if request.respond(output).is_err() {
                warn!(
                    request = type_name::<Request<Q::Input, Q::Output>>(),
                    "reply already consumed, extra responder output dropped"
                );
            }
        });
    }
}

impl<M, Q> Subscriber<ClosedBus<M>> for Responder<Q>
where
    M: MessageSet,
    Q: Requestor + 'static,
    Q::Input: 'static,
    Q::Output: 'static,
    Request<Q::Input, Q::Output>: Kind<M>,
{
    fn register_with(&self, bus: &ClosedBus<M>) {
        let requestor = Rc::clone(&self.requestor);
        bus.subscribe(move |request: Request<Q::Input, Q::Output>| {
            let output = requestor.action(request.input());
            if request.respond(output).is_err() {
                warn!(
                    request = type_name::<Request<Q::Input, Q::Output>>(),
                    "reply already consumed, extra responder output dropped"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn respond_fires_the_callback_once() {
        let result = Rc::new(RefCell::new(Vec::new()));
        let slot = Rc::clone(&result);
        let request = Request::new(3u32, move |n: u32| slot.borrow_mut().push(n));

        assert!(!request.responded());
        assert_eq!(request.respond(9), Ok(()));
        assert!(request.responded());
        assert_eq!(*result.borrow(), vec![9]);

        assert_eq!(request.respond(10), Err(BusError::ReplyConsumed));
        assert_eq!(*result.borrow(), vec![9]);
    }

    #[test]
    fn clones_share_the_reply_slot() {
        let result = Rc::new(RefCell::new(Vec::new()));
        let slot = Rc::clone(&result);
        let request = Request::new("in".to_string(), move |n: u32| slot.borrow_mut().push(n));

        let copy = request.clone();
        assert_eq!(copy.respond(1), Ok(()));
        assert_eq!(request.respond(2), Err(BusError::ReplyConsumed));
        assert_eq!(*result.borrow(), vec![1]);
    }

    #[test]
    fn debug_shows_input_and_reply_state() {
        let request = Request::new(7u8, |_: u8| {});
        assert_eq!(
            format!("{:?}", request),
            "Request { input: 7, responded: false }"
        );
        request.respond(0).unwrap();
        assert_eq!(
            format!("{:?}", request),
            "Request { input: 7, responded: true }"
        );
    }
}
