//! Immutable snapshot store which changes you can subscribe to, along with
//! memoized selections over it.
//!
//!
//!
//!
//! # Replacing snapshots
//!
//! ```
//! use std::rc::Rc;
//!
//! use videoroom_reactive::Store;
//!
//! let store = Store::new(vec![1u32]);
//!
//! // Snapshot is never mutated in place, it is replaced wholesale:
//! store.set_snapshot(|prev| {
//!     let mut next = Vec::clone(prev);
//!     next.push(2);
//!     Rc::new(next)
//! });
//! assert_eq!(*store.get_snapshot(), vec![1, 2]);
//!
//! // Returning the very same `Rc` means "nothing changed":
//! let before = store.get_snapshot();
//! store.set_snapshot(Rc::clone);
//! assert!(Rc::ptr_eq(&before, &store.get_snapshot()));
//! ```
//!
//!
//!
//!
//! # Subscribing to a narrow slice of a snapshot
//!
//! ```
//! use std::rc::Rc;
//!
//! use videoroom_reactive::{Selection, Store};
//! # use futures::{executor, StreamExt as _};
//!
//! # executor::block_on(async {
//! #[derive(Clone)]
//! struct State {
//!     name: String,
//!     clicks: u32,
//! }
//!
//! let store = Store::new(State { name: "foo".into(), clicks: 0 });
//! let name = Selection::new(Some(&store), |state: Option<&State>| {
//!     state.map(|s| s.name.clone())
//! });
//! let mut names = name.changes();
//!
//! // Current value is yielded first:
//! assert_eq!(*names.next().await.unwrap(), Some("foo".to_owned()));
//!
//! // Unrelated changes don't produce new values:
//! store.set_snapshot(|prev| {
//!     Rc::new(State { clicks: prev.clicks + 1, ..State::clone(prev) })
//! });
//! store.set_snapshot(|prev| {
//!     Rc::new(State { name: "bar".into(), ..State::clone(prev) })
//! });
//! assert_eq!(*names.next().await.unwrap(), Some("bar".to_owned()));
//!
//! // Or wait for a concrete value:
//! let when_baz = name.when_eq(Some("baz".to_owned()));
//! store.set_snapshot(|prev| {
//!     Rc::new(State { name: "baz".into(), ..State::clone(prev) })
//! });
//! when_baz.await.unwrap();
//! # });
//! ```

#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    missing_debug_implementations,
    missing_docs
)]
#![forbid(non_ascii_idents, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

mod memo;
mod selection;
mod store;

#[doc(inline)]
pub use self::{
    memo::Memoized,
    selection::{Dropped, Selection},
    store::{Store, Subscription},
};
