//! Self-registration hook for subscriber components.

/// A component that registers its own callbacks against a bus.
///
/// `register_with` is called exactly once per bus the component is batched
/// onto, by [`subscribe_all`](crate::RegistryBus::subscribe_all) or the
/// `with_subscribers` constructors; inside it the component calls
/// `subscribe` for each message kind it cares about.
///
/// The trait is generic over the bus type so one component can register
/// against both bus variants:
///
/// ```
/// use kindbus::{RegistryBus, Subscriber};
///
/// struct AuditLog;
/// struct UserCreated { name: String }
///
/// impl Subscriber<RegistryBus> for AuditLog {
///     fn register_with(&self, bus: &RegistryBus) {
///         bus.subscribe(|user: &UserCreated| {
///             let _ = &user.name;
///         });
///     }
/// }
///
/// let audit = AuditLog;
/// let bus = RegistryBus::with_subscribers(&[&audit]);
/// bus.send_message(UserCreated { name: "ada".to_string() });
/// assert_eq!(bus.drain().unwrap(), 1);
/// ```
pub trait Subscriber<B> {
    /// Register this component's callbacks against `bus`.
    fn register_with(&self, bus: &B);
}
