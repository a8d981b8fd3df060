//! The single-assignment future.
//!
//! A [Future] is a container that settles exactly once: it starts out
//! pending and moves to exactly one of two terminal states, accepted with a
//! value or rejected with a reason. The transition is driven by the future's
//! [Resolver], handed out at construction time; holders of the future itself
//! can only observe the outcome, by registering callbacks or by building
//! dependent futures with the chaining methods.
//!
//! Callbacks never run on the stack that settles the future. They are
//! deferred through the [schedule](crate::schedule) module and fire on a
//! later turn, in registration order.
//!
//! # Example
//!
//! ```
//! use settle::future::Future;
//! use settle::settling::Settling;
//!
//! let answer = Future::<i32, String>::new(|resolver| {
//!     resolver.accept(21);
//!     Ok(())
//! });
//!
//! let doubled = answer.then(|n| Ok(Settling::Value(n * 2)));
//!
//! assert_eq!(doubled.join(), Ok(42));
//! ```
//!
//! # Chaining
//!
//! [Future::then] and friends each produce a new future that settles from
//! the antecedent's outcome run through the supplied callback. A callback
//! returning `Err` rejects the dependent future; a callback returning a
//! [Settling::Future] or [Settling::Thenable] makes the dependent future
//! adopt that value's eventual outcome. [Future::done] is the terminal
//! consumer: it registers plain callbacks and builds nothing, and
//! [Future::done_accept] reports an otherwise-unhandled rejection through
//! the `log` facade rather than swallowing it.
use std::{cell::RefCell, fmt::Debug, rc::Rc};

use log::error;

use crate::{
    resolver::Resolver,
    schedule,
    settling::{Callback, Settling},
};

pub(crate) enum State<T, E> {
    Pending {
        on_accept: Vec<Callback<T>>,
        on_reject: Vec<Callback<E>>,
    },
    Accepted(T),
    Rejected(E),
}

/// A single-assignment container for an eventually-available result.
///
/// Cloning a `Future` clones the handle, not the container; all clones
/// observe the same settlement.
pub struct Future<T, E> {
    pub(crate) shared: Rc<RefCell<State<T, E>>>,
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T, E> Future<T, E> {
    /// Whether two handles refer to the same underlying container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Create a pending future together with its resolver.
    ///
    /// The resolver is the only way to settle the future. Dropping it
    /// without settling leaves the future pending forever.
    pub fn pair() -> (Self, Resolver<T, E>) {
        let shared = Rc::new(RefCell::new(State::Pending {
            on_accept: Vec::new(),
            on_reject: Vec::new(),
        }));

        let fut = Self {
            shared: Rc::clone(&shared),
        };

        (fut, Resolver::bind(shared))
    }

    /// Create a future and run `executor` with its resolver.
    ///
    /// The executor runs synchronously, before this function returns. If it
    /// returns `Err` the future is rejected with that value; an earlier
    /// settlement made by the executor itself wins over the error.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let (fut, resolver) = Self::pair();

        if let Err(reason) = executor(resolver.clone()) {
            resolver.reject(reason);
        }

        fut
    }

    /// A future already accepted with `value`.
    ///
    /// The value is taken literally: if `T` is itself a future type, no
    /// unwrapping occurs.
    pub fn accepted(value: T) -> Self {
        Self::new(|resolver| {
            resolver.accept(value);
            Ok(())
        })
    }

    /// A future already rejected with `reason`.
    pub fn rejected(reason: E) -> Self {
        Self::new(|resolver| {
            resolver.reject(reason);
            Ok(())
        })
    }

    /// A future settled from `value` with the resolve algorithm: plain
    /// values accept, futures and thenables are adopted.
    pub fn resolved(value: impl Into<Settling<T, E>>) -> Self {
        let (fut, resolver) = Self::pair();
        resolver.resolve(value);
        fut
    }

    /// Register a callback pair with this future.
    ///
    /// Either callback may be absent. While the future is pending the
    /// callbacks are stored in registration order; once it is terminal the
    /// matching callback is deferred immediately with a clone of the settled
    /// result.
    pub fn append(&self, on_accept: Option<Callback<T>>, on_reject: Option<Callback<E>>) {
        match &mut *self.shared.borrow_mut() {
            State::Pending {
                on_accept: accepts,
                on_reject: rejects,
            } => {
                if let Some(callback) = on_accept {
                    accepts.push(callback);
                }
                if let Some(callback) = on_reject {
                    rejects.push(callback);
                }
            }
            State::Accepted(value) => {
                if let Some(callback) = on_accept {
                    let value = value.clone();
                    schedule::defer(Box::new(move || callback(value)));
                }
            }
            State::Rejected(reason) => {
                if let Some(callback) = on_reject {
                    let reason = reason.clone();
                    schedule::defer(Box::new(move || callback(reason)));
                }
            }
        }
    }

    /// Build a dependent future from this future's accepted value.
    ///
    /// `on_accept` receives the accepted value; its `Ok` result settles the
    /// dependent future through the resolve algorithm and its `Err` rejects
    /// it. A rejection of this future passes through to the dependent
    /// future unchanged.
    pub fn then<U, F>(&self, on_accept: F) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<Settling<U, E>, E> + 'static,
    {
        let (next, resolver) = Future::pair();
        let reject_forward = resolver.clone();

        self.append(
            Some(wrap(on_accept, resolver)),
            Some(Box::new(move |reason| reject_forward.reject_now(reason))),
        );

        next
    }

    /// [Future::then] with a handler for both directions.
    ///
    /// `on_reject` can recover from a rejection by returning `Ok`, in which
    /// case the dependent future accepts.
    pub fn then_else<U, F, G>(&self, on_accept: F, on_reject: G) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<Settling<U, E>, E> + 'static,
        G: FnOnce(E) -> Result<Settling<U, E>, E> + 'static,
    {
        let (next, resolver) = Future::pair();

        self.append(
            Some(wrap(on_accept, resolver.clone())),
            Some(wrap(on_reject, resolver)),
        );

        next
    }

    /// Build a dependent future that recovers from a rejection.
    ///
    /// An accepted value passes through to the dependent future unchanged.
    pub fn catch<G>(&self, on_reject: G) -> Future<T, E>
    where
        G: FnOnce(E) -> Result<Settling<T, E>, E> + 'static,
    {
        let (next, resolver) = Future::pair();
        let accept_forward = resolver.clone();

        self.append(
            Some(Box::new(move |value| {
                accept_forward.resolve_now(Settling::Value(value));
            })),
            Some(wrap(on_reject, resolver)),
        );

        next
    }

    /// A dependent future with no handlers: both the accepted value and the
    /// rejection reason pass through unchanged.
    pub fn forwarded(&self) -> Future<T, E> {
        let (next, resolver) = Future::pair();
        let reject_forward = resolver.clone();

        self.append(
            Some(Box::new(move |value| {
                resolver.resolve_now(Settling::Value(value));
            })),
            Some(Box::new(move |reason| reject_forward.reject_now(reason))),
        );

        next
    }

    /// Terminally consume this future with a callback for each direction.
    ///
    /// No dependent future is built.
    pub fn done<F, G>(&self, on_accept: F, on_reject: G)
    where
        F: FnOnce(T) + 'static,
        G: FnOnce(E) + 'static,
    {
        self.append(Some(Box::new(on_accept)), Some(Box::new(on_reject)));
    }

    /// Terminally consume this future's accepted value.
    ///
    /// A rejection reaching this consumer has no handler left, so it is
    /// reported through `log::error!` instead of being swallowed.
    pub fn done_accept<F>(&self, on_accept: F)
    where
        F: FnOnce(T) + 'static,
        E: Debug,
    {
        self.append(
            Some(Box::new(on_accept)),
            Some(Box::new(|reason: E| {
                error!("unhandled rejection: {reason:?}");
            })),
        );
    }

    /// Terminally consume this future's rejection reason, ignoring the
    /// accepted value.
    pub fn done_reject<G>(&self, on_reject: G)
    where
        G: FnOnce(E) + 'static,
    {
        self.append(None, Some(Box::new(on_reject)));
    }

    /// The settled result, or `None` while pending.
    pub fn settled(&self) -> Option<Result<T, E>> {
        match &*self.shared.borrow() {
            State::Pending { .. } => None,
            State::Accepted(value) => Some(Ok(value.clone())),
            State::Rejected(reason) => Some(Err(reason.clone())),
        }
    }

    /// Pump this thread's deferred-task queue to completion and return the
    /// settled result.
    ///
    /// # Panics
    ///
    /// Panics if the future still hasn't settled once the queue is empty,
    /// which means no reachable work can ever settle it.
    pub fn join(self) -> Result<T, E> {
        schedule::run();

        self.settled().expect("future cannot settle")
    }
}

/// The wrapper-callback algorithm shared by the chaining methods.
///
/// Produces a callback that feeds `callback`'s `Ok` result into the target
/// resolver's resolve algorithm and its `Err` into reject. Forwarding is
/// synchronous; the settlement that invokes the wrapper already crossed a
/// turn boundary.
fn wrap<V, U, E, F>(callback: F, resolver: Resolver<U, E>) -> Callback<V>
where
    V: 'static,
    U: Clone + 'static,
    E: Clone + 'static,
    F: FnOnce(V) -> Result<Settling<U, E>, E> + 'static,
{
    Box::new(move |value| match callback(value) {
        Ok(settling) => resolver.resolve_now(settling),
        Err(reason) => resolver.reject_now(reason),
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::Future;
    use crate::{schedule, settling::Settling};

    #[test]
    fn executor_accepts() {
        let fut = Future::<i32, String>::new(|resolver| {
            resolver.accept(3);
            Ok(())
        });

        assert_eq!(fut.join(), Ok(3));
    }

    #[test]
    fn executor_error_rejects() {
        let fut = Future::<i32, String>::new(|_| Err("exec failed".into()));

        assert_eq!(fut.join(), Err("exec failed".into()));
    }

    #[test]
    fn executor_settlement_beats_its_error() {
        let fut = Future::<i32, String>::new(|resolver| {
            resolver.accept(1);
            Err("too late".into())
        });

        assert_eq!(fut.join(), Ok(1));
    }

    #[test]
    fn callbacks_are_deferred() {
        let fut = Future::<i32, &str>::accepted(1);
        let seen = Rc::new(RefCell::new(Vec::new()));

        {
            let seen = seen.clone();
            fut.done_accept(move |v| seen.borrow_mut().push(v));
        }

        assert!(seen.borrow().is_empty());

        schedule::run();

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn registration_order_is_preserved() {
        let (fut, resolver) = Future::<i32, &str>::pair();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in 0..4 {
            let seen = seen.clone();
            fut.done_accept(move |_| seen.borrow_mut().push(tag));
        }

        resolver.accept(0);
        schedule::run();

        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn append_during_drain_runs_later() {
        let (fut, resolver) = Future::<i32, &str>::pair();
        let seen = Rc::new(RefCell::new(Vec::new()));

        {
            let seen = seen.clone();
            let again = fut.clone();
            fut.done_accept(move |v| {
                seen.borrow_mut().push(("first", v));
                let seen = seen.clone();
                again.done_accept(move |v| seen.borrow_mut().push(("second", v)));
            });
        }

        resolver.accept(7);
        schedule::run();

        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn chains_compose() -> anyhow::Result<()> {
        let fut = Future::<i32, String>::accepted(2)
            .then(|n| Ok(Settling::Value(n + 2)))
            .then(|n| Ok(Settling::Value(n * 3)));

        let n = fut.join().map_err(anyhow::Error::msg)?;
        assert_eq!(n, 12);

        Ok(())
    }

    #[test]
    fn then_maps_the_accepted_value() {
        let fut = Future::<i32, String>::accepted(4).then(|n| Ok(Settling::Value(n * 10)));

        assert_eq!(fut.join(), Ok(40));
    }

    #[test]
    fn then_error_rejects_the_dependent() {
        let fut = Future::<i32, String>::accepted(1).then::<i32, _>(|_| Err("boom".into()));

        assert_eq!(fut.join(), Err("boom".into()));
    }

    #[test]
    fn then_passes_rejections_through() {
        let fut = Future::<i32, String>::rejected("e".into())
            .then(|n| Ok(Settling::Value(n + 1)));

        assert_eq!(fut.join(), Err("e".into()));
    }

    #[test]
    fn then_adopts_a_returned_future() {
        let inner = Future::<i32, String>::accepted(9);
        let fut = Future::<i32, String>::accepted(0).then(move |_| Ok(Settling::Future(inner)));

        assert_eq!(fut.join(), Ok(9));
    }

    #[test]
    fn then_else_recovers() {
        let fut = Future::<i32, String>::rejected("e".into())
            .then_else(|n| Ok(Settling::Value(n)), |reason| Ok(Settling::Value(reason.len() as i32)));

        assert_eq!(fut.join(), Ok(1));
    }

    #[test]
    fn catch_recovers_and_passes_accepts_through() {
        let recovered = Future::<i32, String>::rejected("err".into())
            .catch(|reason| Ok(Settling::Value(reason.len() as i32)));
        let untouched = Future::<i32, String>::accepted(5).catch(|_| Ok(Settling::Value(0)));

        assert_eq!(recovered.join(), Ok(3));
        assert_eq!(untouched.join(), Ok(5));
    }

    #[test]
    fn forwarded_is_a_pass_through() {
        let accepted = Future::<i32, String>::accepted(1).forwarded();
        let rejected = Future::<i32, String>::rejected("e".into()).forwarded();

        assert_eq!(accepted.join(), Ok(1));
        assert_eq!(rejected.join(), Err("e".into()));
    }

    #[test]
    fn done_receives_both_directions() {
        let seen = Rc::new(RefCell::new(Vec::new()));

        {
            let seen = seen.clone();
            Future::<i32, String>::accepted(1)
                .done(move |v| seen.borrow_mut().push(format!("ok {v}")), |_| {});
        }
        {
            let seen = seen.clone();
            Future::<i32, String>::rejected("e".into())
                .done(|_| {}, move |r| seen.borrow_mut().push(format!("err {r}")));
        }

        schedule::run();

        assert_eq!(*seen.borrow(), vec!["ok 1".to_string(), "err e".to_string()]);
    }

    #[test]
    fn done_accept_never_sees_a_rejection() {
        let fut = Future::<i32, String>::rejected("e".into());
        let ran = Rc::new(RefCell::new(false));

        {
            let ran = ran.clone();
            fut.done_accept(move |_| *ran.borrow_mut() = true);
        }

        schedule::run();

        assert!(!*ran.borrow());
    }

    #[test]
    fn accepted_future_valued_result_is_not_unwrapped() {
        let inner = Future::<i32, String>::accepted(7);
        let outer =
            Future::<Future<i32, String>, String>::accepted(inner.clone());

        let got = outer.join().unwrap();

        assert!(got.ptr_eq(&inner));
        assert_eq!(got.join(), Ok(7));
    }
}
