//! The settlement capability.
//!
//! A [Resolver] is the one-shot capability bound to a single
//! [Future](crate::future::Future) at construction time, and the only party
//! that can move it out of the pending state. It exposes the three
//! settlement algorithms:
//!
//! - [Resolver::accept] settles with a value taken literally,
//! - [Resolver::resolve] settles with a value, adopting its eventual
//!   outcome when it is a future or a thenable,
//! - [Resolver::reject] settles the failure direction with a reason taken
//!   literally.
//!
//! The first successful call latches the resolver; every later call is a
//! silent no-op, never an error. Cloning a resolver clones the capability
//! handle; all clones share the latch.
use std::{
    cell::{Cell, RefCell},
    mem,
    rc::Rc,
};

use crate::{
    future::State,
    schedule,
    settling::{Callback, Settling},
};

#[derive(Clone, Copy)]
enum Dispatch {
    /// Hand each callback to the scheduler.
    Deferred,
    /// Run each callback on the caller's stack. Used only where the caller
    /// already crossed a turn boundary.
    Now,
}

/// The one-shot settlement capability for a single future.
pub struct Resolver<T, E> {
    shared: Rc<RefCell<State<T, E>>>,
    resolved: Rc<Cell<bool>>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            resolved: Rc::clone(&self.resolved),
        }
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub(crate) fn bind(shared: Rc<RefCell<State<T, E>>>) -> Self {
        Self {
            shared,
            resolved: Rc::new(Cell::new(false)),
        }
    }

    /// Settle the bound future as accepted with `value`, exactly as given.
    ///
    /// No unwrapping occurs, even when `T` is itself a future type. The
    /// accept callbacks are dispatched on a later turn. No-op once the
    /// resolver is latched.
    pub fn accept(&self, value: T) {
        if self.commit() {
            self.settle_accepted(value, Dispatch::Deferred);
        }
    }

    /// Settle the bound future from `value`, adopting future-like operands.
    ///
    /// A [Settling::Value] degrades to [Resolver::accept]. A
    /// [Settling::Future] or [Settling::Thenable] is adopted: this resolver
    /// follows the operand and settles in the same direction once it does.
    /// A thenable whose `then` fails synchronously rejects with that error.
    ///
    /// Adoption latches the resolver immediately, so a manual settlement
    /// racing an adopted outcome is a no-op.
    pub fn resolve(&self, value: impl Into<Settling<T, E>>) {
        if self.commit() {
            self.adopt(value.into(), Dispatch::Deferred);
        }
    }

    /// Settle the bound future as rejected with `reason`, exactly as given.
    ///
    /// Symmetric to [Resolver::accept]: no unwrapping, dispatch on a later
    /// turn, no-op once latched.
    pub fn reject(&self, reason: E) {
        if self.commit() {
            self.settle_rejected(reason, Dispatch::Deferred);
        }
    }

    /// [Resolver::resolve] with same-turn dispatch, for chain-internal
    /// forwarding that already crossed a turn boundary.
    pub(crate) fn resolve_now(&self, value: Settling<T, E>) {
        if self.commit() {
            self.adopt(value, Dispatch::Now);
        }
    }

    /// [Resolver::reject] with same-turn dispatch.
    pub(crate) fn reject_now(&self, reason: E) {
        if self.commit() {
            self.settle_rejected(reason, Dispatch::Now);
        }
    }

    /// Latch the resolver. Returns whether this call won the latch.
    fn commit(&self) -> bool {
        !self.resolved.replace(true)
    }

    fn adopt(&self, value: Settling<T, E>, dispatch: Dispatch) {
        match value {
            Settling::Value(v) => self.settle_accepted(v, dispatch),
            Settling::Future(future) => {
                let accepting = self.clone();
                let rejecting = self.clone();

                future.append(
                    Some(Box::new(move |v| {
                        accepting.settle_accepted(v, Dispatch::Now);
                    })),
                    Some(Box::new(move |e| {
                        rejecting.settle_rejected(e, Dispatch::Now);
                    })),
                );
            }
            Settling::Thenable(thenable) => {
                let accepting = self.clone();
                let rejecting = self.clone();

                let outcome = thenable.then(
                    Box::new(move |v| accepting.settle_accepted(v, Dispatch::Now)),
                    Box::new(move |e| rejecting.settle_rejected(e, Dispatch::Now)),
                );

                if let Err(reason) = outcome {
                    self.settle_rejected(reason, dispatch);
                }
            }
        }
    }

    /// Write the accepted state and drain the accept callbacks.
    ///
    /// Guarded by the state itself rather than the latch: adoption forwards
    /// land here after the latch is already set, and a terminal state makes
    /// any further write a no-op.
    fn settle_accepted(&self, value: T, dispatch: Dispatch) {
        let callbacks = {
            let mut state = self.shared.borrow_mut();

            match mem::replace(&mut *state, State::Accepted(value.clone())) {
                State::Pending { on_accept, .. } => on_accept,
                settled => {
                    *state = settled;
                    return;
                }
            }
        };

        process(callbacks, value, dispatch);
    }

    fn settle_rejected(&self, reason: E, dispatch: Dispatch) {
        let callbacks = {
            let mut state = self.shared.borrow_mut();

            match mem::replace(&mut *state, State::Rejected(reason.clone())) {
                State::Pending { on_reject, .. } => on_reject,
                settled => {
                    *state = settled;
                    return;
                }
            }
        };

        process(callbacks, reason, dispatch);
    }
}

/// Drain a detached callback sequence front-to-back.
///
/// The sequence was removed from the future's state before this runs, so a
/// callback registering more callbacks goes through a fresh `append` against
/// the now-terminal state and cannot re-enter this drain.
fn process<V>(callbacks: Vec<Callback<V>>, result: V, dispatch: Dispatch)
where
    V: Clone + 'static,
{
    for callback in callbacks {
        let value = result.clone();

        match dispatch {
            Dispatch::Now => callback(value),
            Dispatch::Deferred => schedule::defer(Box::new(move || callback(value))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use crate::{
        future::Future,
        schedule,
        settling::{Callback, Settling, Thenable},
    };

    struct Immediate(i32);

    impl Thenable<i32, String> for Immediate {
        fn then(
            self: Box<Self>,
            on_accept: Callback<i32>,
            _on_reject: Callback<String>,
        ) -> Result<(), String> {
            on_accept(self.0);
            Ok(())
        }
    }

    struct Faulty;

    impl Thenable<i32, String> for Faulty {
        fn then(
            self: Box<Self>,
            _on_accept: Callback<i32>,
            _on_reject: Callback<String>,
        ) -> Result<(), String> {
            Err("broken thenable".into())
        }
    }

    struct TwoFaced;

    impl Thenable<i32, String> for TwoFaced {
        fn then(
            self: Box<Self>,
            on_accept: Callback<i32>,
            on_reject: Callback<String>,
        ) -> Result<(), String> {
            on_accept(1);
            on_reject("late".into());
            Ok(())
        }
    }

    #[test]
    fn second_settlement_is_a_no_op() {
        let (fut, resolver) = Future::<i32, &str>::pair();

        resolver.accept(1);
        resolver.reject("x");
        resolver.accept(2);

        assert_eq!(fut.join(), Ok(1));
    }

    #[test]
    fn resolve_of_a_plain_value_accepts() {
        let (fut, resolver) = Future::<i32, String>::pair();

        resolver.resolve(5);

        assert_eq!(fut.join(), Ok(5));
    }

    #[test]
    fn resolve_adopts_a_future() {
        let (inner, inner_resolver) = Future::<i32, String>::pair();
        let outer = Future::resolved(Settling::Future(inner));

        inner_resolver.accept(5);

        assert_eq!(outer.join(), Ok(5));
    }

    #[test]
    fn resolve_adopts_transitively() {
        let (inner, inner_resolver) = Future::<i32, String>::pair();
        let mid: Future<i32, String> = Future::resolved(Settling::Future(inner));
        let outer: Future<i32, String> = Future::resolved(Settling::Future(mid));

        inner_resolver.reject("deep".into());

        assert_eq!(outer.join(), Err("deep".into()));
    }

    #[test]
    fn manual_settle_after_adoption_is_a_no_op() {
        let (followed, followed_resolver) = Future::<i32, String>::pair();
        let (fut, resolver) = Future::<i32, String>::pair();

        resolver.resolve(Settling::Future(followed));
        resolver.accept(99);
        followed_resolver.accept(3);

        assert_eq!(fut.join(), Ok(3));
    }

    #[test]
    fn resolve_adopts_a_thenable() {
        let fut =
            Future::<i32, String>::resolved(Settling::Thenable(Box::new(Immediate(8))));

        assert_eq!(fut.join(), Ok(8));
    }

    #[test]
    fn faulty_thenable_rejects() {
        let fut = Future::<i32, String>::resolved(Settling::Thenable(Box::new(Faulty)));

        assert_eq!(fut.join(), Err("broken thenable".into()));
    }

    #[test]
    fn misbehaving_thenable_cannot_double_settle() {
        let fut = Future::<i32, String>::resolved(Settling::Thenable(Box::new(TwoFaced)));

        assert_eq!(fut.join(), Ok(1));
    }

    #[test]
    fn public_settles_dispatch_on_a_later_turn() {
        let (fut, resolver) = Future::<i32, &str>::pair();
        let seen = Rc::new(RefCell::new(Vec::new()));

        {
            let seen = seen.clone();
            fut.done_accept(move |v| seen.borrow_mut().push(v));
        }

        resolver.accept(4);

        assert!(seen.borrow().is_empty());

        schedule::run();

        assert_eq!(*seen.borrow(), vec![4]);
    }
}
