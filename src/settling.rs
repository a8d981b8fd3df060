//! Settlement operands.
//!
//! A resolver can be driven with three kinds of operand: a plain value, a
//! native [Future], or a foreign [Thenable]. The [Settling] union captures
//! that choice once, up front, so the settlement algorithms match on a
//! variant instead of probing values for future-like behaviour.
use crate::future::Future;

/// A unary settlement callback.
pub type Callback<V> = Box<dyn FnOnce(V)>;

/// A foreign future-like value.
///
/// Implementors hand their eventual outcome to exactly one of the two
/// callbacks. A synchronous failure while wiring the callbacks up is
/// reported as `Err`, and the adopting resolver rejects with it.
pub trait Thenable<T, E> {
    /// Register the outcome callbacks with this value.
    fn then(self: Box<Self>, on_accept: Callback<T>, on_reject: Callback<E>) -> Result<(), E>;
}

/// An operand for the resolve settlement algorithm.
pub enum Settling<T, E> {
    /// A plain value; settling accepts it as-is.
    Value(T),
    /// A native future; settling adopts its eventual outcome.
    Future(Future<T, E>),
    /// A foreign future-like value; settling adopts it through [Thenable].
    Thenable(Box<dyn Thenable<T, E>>),
}

impl<T, E> Settling<T, E> {
    /// Whether this operand is a native [Future]. False for foreign
    /// thenables.
    pub fn is_future(&self) -> bool {
        matches!(self, Settling::Future(_))
    }
}

impl<T, E> From<T> for Settling<T, E> {
    fn from(value: T) -> Self {
        Settling::Value(value)
    }
}

impl<T, E> From<Future<T, E>> for Settling<T, E> {
    fn from(future: Future<T, E>) -> Self {
        Settling::Future(future)
    }
}

impl<T, E> From<Box<dyn Thenable<T, E>>> for Settling<T, E> {
    fn from(thenable: Box<dyn Thenable<T, E>>) -> Self {
        Settling::Thenable(thenable)
    }
}
