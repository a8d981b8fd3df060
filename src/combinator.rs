//! Aggregate combinators.
//!
//! Combinators take a list of [Settling] operands, normalize each one with
//! [from] (plain values become already-accepted futures, futures race on
//! their eventual outcome, thenables are adopted) and aggregate the
//! settlements into a single future. They are ordinary callers of the
//! public [Future](crate::future::Future) and
//! [Resolver](crate::resolver::Resolver) surface; none of them touches
//! internal state.
//!
//! Aggregate results preserve the original operand order regardless of the
//! order in which operands settle.
//!
//! # Example
//!
//! ```
//! use settle::combinator::every;
//! use settle::future::Future;
//!
//! let all = every::<i32, String>(vec![
//!     Future::accepted(1).into(),
//!     Future::accepted(2).into(),
//!     3.into(),
//! ]);
//!
//! assert_eq!(all.join(), Ok(vec![1, 2, 3]));
//! ```
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{future::Future, settling::Settling};

/// Coerce a settlement operand into a future.
///
/// A [Settling::Future] is returned as-is, the same container under the same
/// handle. A [Settling::Thenable] is wrapped in a new future that adopts it
/// and a [Settling::Value] in an already-accepted one.
pub fn from<T, E>(value: impl Into<Settling<T, E>>) -> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    match value.into() {
        Settling::Future(future) => future,
        settling => Future::resolved(settling),
    }
}

/// Settle with the first operand to settle, in either direction.
///
/// The acceptance race is registered across all operands before the
/// rejection race, so the two directions race independently: among operands
/// that have already settled, an acceptance wins over a rejection regardless
/// of operand position. No array wrapping occurs; the winning value or
/// reason is forwarded raw. An empty operand list accepts `T::default()`.
pub fn any<T, E>(operands: impl IntoIterator<Item = Settling<T, E>>) -> Future<T, E>
where
    T: Clone + Default + 'static,
    E: Clone + 'static,
{
    let (fut, resolver) = Future::pair();
    let futures: Vec<Future<T, E>> = operands.into_iter().map(from).collect();

    if futures.is_empty() {
        resolver.accept(T::default());
        return fut;
    }

    for future in &futures {
        let accepting = resolver.clone();
        future.append(Some(Box::new(move |v| accepting.accept(v))), None);
    }

    for future in &futures {
        let rejecting = resolver.clone();
        future.append(None, Some(Box::new(move |e| rejecting.reject(e))));
    }

    fut
}

/// Accept with every operand's value once all operands accept, or reject
/// with the first rejection to occur.
///
/// The result array is indexed by original operand position, not settlement
/// order. An empty operand list accepts an empty array.
pub fn every<T, E>(operands: impl IntoIterator<Item = Settling<T, E>>) -> Future<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let (fut, resolver) = Future::pair();
    let futures: Vec<Future<T, E>> = operands.into_iter().map(from).collect();

    if futures.is_empty() {
        resolver.accept(Vec::new());
        return fut;
    }

    let remaining = Rc::new(Cell::new(futures.len()));
    let results: Rc<RefCell<Vec<Option<T>>>> =
        Rc::new(RefCell::new(vec![None; futures.len()]));

    for (idx, future) in futures.iter().enumerate() {
        let accepting = resolver.clone();
        let remaining = remaining.clone();
        let results = results.clone();

        future.append(
            Some(Box::new(move |value| {
                results.borrow_mut()[idx] = Some(value);
                remaining.set(remaining.get() - 1);

                if remaining.get() == 0 {
                    let values: Vec<T> = results
                        .borrow_mut()
                        .drain(..)
                        .map(|slot| slot.unwrap())
                        .collect();
                    accepting.accept(values);
                }
            })),
            None,
        );

        let rejecting = resolver.clone();
        future.append(None, Some(Box::new(move |reason| rejecting.reject(reason))));
    }

    fut
}

/// Accept with the first operand to accept, or reject with every operand's
/// reason once all operands reject.
///
/// The reason array preserves original operand order. An empty operand list
/// accepts `T::default()`.
pub fn some<T, E>(operands: impl IntoIterator<Item = Settling<T, E>>) -> Future<T, Vec<E>>
where
    T: Clone + Default + 'static,
    E: Clone + 'static,
{
    let (fut, resolver) = Future::pair();
    let futures: Vec<Future<T, E>> = operands.into_iter().map(from).collect();

    if futures.is_empty() {
        resolver.accept(T::default());
        return fut;
    }

    let remaining = Rc::new(Cell::new(futures.len()));
    let reasons: Rc<RefCell<Vec<Option<E>>>> =
        Rc::new(RefCell::new(vec![None; futures.len()]));

    for (idx, future) in futures.iter().enumerate() {
        let accepting = resolver.clone();
        future.append(Some(Box::new(move |value| accepting.accept(value))), None);

        let rejecting = resolver.clone();
        let remaining = remaining.clone();
        let reasons = reasons.clone();

        future.append(
            None,
            Some(Box::new(move |reason| {
                reasons.borrow_mut()[idx] = Some(reason);
                remaining.set(remaining.get() - 1);

                if remaining.get() == 0 {
                    let collected: Vec<E> = reasons
                        .borrow_mut()
                        .drain(..)
                        .map(|slot| slot.unwrap())
                        .collect();
                    rejecting.reject(collected);
                }
            })),
        );
    }

    fut
}
