//! # `settle`: a single-assignment future primitive
//!
//! This crate implements a small, self-contained asynchronous-value
//! primitive, written in as few lines as possible. A
//! [Future](future::Future) is a container that settles exactly once,
//! moving from pending to either accepted with a value or rejected with a
//! reason; its [Resolver](resolver::Resolver) is the one-shot capability
//! that performs the transition. On top of that sit callback chains
//! (`then`/`catch`/`done`) and aggregate combinators (`any`, `every`,
//! `some`).
//!
//! Everything runs on a single thread, cooperatively: settling a future
//! never invokes callbacks on the settling stack. Callbacks are deferred
//! through the [schedule] module's per-thread queue and fire on a later
//! turn, once the thread pumps the queue.
//!
//! For constructing and chaining futures, refer to the [future] module. For
//! the settlement algorithms, see [resolver]; for aggregating many futures,
//! see [combinator].
//!
//! ## Example
//!
//! A chain that settles from two racing sources:
//!
//! ```
//! use settle::combinator::any;
//! use settle::future::Future;
//! use settle::settling::Settling;
//!
//! let (primary, primary_resolver) = Future::<String, String>::pair();
//! let (fallback, fallback_resolver) = Future::<String, String>::pair();
//!
//! let greeting = any::<String, String>(vec![primary.into(), fallback.into()])
//!     .then(|who| Ok(Settling::Value(format!("Hello, {who}!"))));
//!
//! fallback_resolver.accept("world".into());
//! primary_resolver.reject("unreachable".into());
//!
//! assert_eq!(greeting.join(), Ok("Hello, world!".into()));
//! ```
pub mod combinator;
pub mod future;
pub mod resolver;
pub mod schedule;
pub mod settling;
