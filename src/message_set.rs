//! Closed-set kind machinery: a fixed, ordered universe of message kinds.
//!
//! A [`MessageSet`] is an enum whose variants are the complete list of kinds
//! a [`ClosedBus`](crate::ClosedBus) can carry. Each variant's payload type
//! implements [`Kind`], tying it to its positional slot in the bus's
//! subscriber table so subscription and dispatch direct-index the table with
//! no runtime lookup. The [`message_set!`](crate::message_set!) macro
//! declares the enum and generates both impls.

/// A closed, ordered universe of message kinds.
///
/// Implemented by the message enum of a [`ClosedBus`](crate::ClosedBus).
/// Usually generated by [`message_set!`](crate::message_set!); a
/// hand-written impl must keep `kind_index` below `KIND_COUNT` and aligned
/// with each payload's [`Kind::INDEX`], or dispatch reports an
/// unknown-kind fault.
pub trait MessageSet: Clone {
    /// Number of kinds in the set. The bus pre-allocates one subscriber
    /// list per kind, so every kind has a table slot by construction.
    const KIND_COUNT: usize;

    /// Positional index of this message's kind within the set.
    fn kind_index(&self) -> usize;

    /// Human-readable kind name, for fault reporting.
    fn kind_name(&self) -> &'static str;
}

/// A payload type that is one kind of a [`MessageSet`].
pub trait Kind<M: MessageSet>: Sized + 'static {
    /// Positional index of this kind's subscriber-table slot.
    const INDEX: usize;

    /// Wrap the payload into its variant of the message enum.
    fn wrap(self) -> M;

    /// Move the payload back out, or `None` if the message is another kind.
    fn extract(message: M) -> Option<Self>;
}

/// Declare a closed message set: the enum plus its [`MessageSet`] impl and
/// one [`Kind`] impl per variant, with slot indices assigned in declaration
/// order.
///
/// A `Clone` derive is emitted automatically (dispatch hands every
/// subscriber an independent value), so each payload type must be `Clone`.
/// Other derives can be added through attributes on the declaration.
///
/// ```
/// use kindbus::{message_set, ClosedBus, Kind, MessageSet};
///
/// #[derive(Clone)]
/// struct Tick;
/// #[derive(Clone)]
/// struct Shutdown { exit_code: i32 }
///
/// message_set! {
///     pub enum ControlMessage {
///         Tick(Tick),
///         Shutdown(Shutdown),
///     }
/// }
///
/// assert_eq!(ControlMessage::KIND_COUNT, 2);
/// assert_eq!(<Shutdown as Kind<ControlMessage>>::INDEX, 1);
///
/// let bus: ClosedBus<ControlMessage> = ClosedBus::new();
/// bus.subscribe(|_tick: Tick| {});
/// ```
#[macro_export]
macro_rules! message_set {
    (@one $variant:ident) => {
        1usize
    };
    (@kind_impls $name:ident, $idx:expr,) => {};
    (@kind_impls $name:ident, $idx:expr, $variant:ident($payload:ty), $($rest:tt)*) => {
        impl $crate::Kind<$name> for $payload {
            const INDEX: usize = $idx;

            fn wrap(self) -> $name {
                $name::$variant(self)
            }

            #[allow(unreachable_patterns)]
            fn extract(message: $name) -> ::core::option::Option<Self> {
                match message {
                    $name::$variant(payload) => ::core::option::Option::Some(payload),
                    _ => ::core::option::Option::None,
                }
            }
        }
        $crate::message_set!(@kind_impls $name, $idx + 1usize, $($rest)*);
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident($payload:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis enum $name {
            $($variant($payload)),+
        }

        impl $crate::MessageSet for $name {
            const KIND_COUNT: usize = 0usize $(+ $crate::message_set!(@one $variant))+;

            fn kind_index(&self) -> usize {
                match self {
                    $($name::$variant(_) => <$payload as $crate::Kind<$name>>::INDEX),+
                }
            }

            fn kind_name(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => stringify!($variant)),+
                }
            }
        }

        $crate::message_set!(@kind_impls $name, 0usize, $($variant($payload),)+);
    };
}
