//! Bridge between a [`Store`] and its observers.

use std::{
    cell::RefCell,
    fmt,
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll},
};

use futures::{
    channel::mpsc,
    future::{self, LocalBoxFuture},
    stream::{LocalBoxStream, Stream},
    StreamExt as _,
};

use crate::{Memoized, Store, Subscription};

/// Error returned from [`Selection::when`] when the observed [`Store`] is gone
/// before the awaited condition has been met.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Dropped;

impl fmt::Display for Dropped {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observed store has been dropped")
    }
}

/// [`Memoized`] selector bound to a [`Store`].
///
/// Doesn't keep the [`Store`] alive. Once the [`Store`] is dropped (or if
/// there was no [`Store`] at all), [`Selection::get`] returns whatever the
/// selector produces for a missing snapshot, and no listener is ever notified.
pub struct Selection<T, O> {
    /// Observed [`Store`].
    store: Weak<Store<T>>,

    /// Memoized selector projecting the [`Store`] snapshot.
    selector: Memoized<T, O>,
}

impl<T, O> Selection<T, O>
where
    T: 'static,
    O: PartialEq + 'static,
{
    /// Binds the provided `selector` to the provided [`Store`].
    pub fn new<S>(store: Option<&Rc<Store<T>>>, selector: S) -> Rc<Self>
    where
        S: Fn(Option<&T>) -> O + 'static,
    {
        Rc::new(Self {
            store: store.map_or_else(Weak::new, Rc::downgrade),
            selector: Memoized::new(selector),
        })
    }

    /// Registers the provided `listener` in the observed [`Store`].
    ///
    /// Returns [`Subscription::noop()`] if there is no [`Store`].
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        match self.store.upgrade() {
            Some(store) => store.subscribe(listener),
            None => Subscription::noop(),
        }
    }

    /// Returns the currently selected value.
    ///
    /// Returns the same [`Rc`] until the selected value really changes.
    pub fn get(&self) -> Rc<O> {
        let snapshot = self.store.upgrade().map(|s| s.get_snapshot());
        self.selector.select(snapshot.as_deref())
    }

    /// Indicates whether the observed [`Store`] is still alive.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.store.strong_count() > 0
    }

    /// Returns a [`Stream`] of the selected values.
    ///
    /// The current value is yielded first, and then every value that isn't
    /// [`Rc::ptr_eq`] to the previously yielded one. The [`Stream`] ends once
    /// the observed [`Store`] is dropped.
    pub fn changes(self: &Rc<Self>) -> LocalBoxStream<'static, Rc<O>> {
        let (tx, rx) = mpsc::unbounded();
        let current = self.get();
        let _ = tx.unbounded_send(Rc::clone(&current));

        let last = RefCell::new(current);
        let this = Rc::downgrade(self);
        let subscription = self.subscribe(move || {
            if let Some(this) = this.upgrade() {
                let value = this.get();
                let mut last = last.borrow_mut();
                if !Rc::ptr_eq(&last, &value) {
                    *last = Rc::clone(&value);
                    let _ = tx.unbounded_send(value);
                }
            }
        });

        Box::pin(Changes {
            rx,
            _subscription: subscription,
            _selection: Rc::clone(self),
        })
    }

    /// Returns [`Future`] resolving once the selected value satisfies the
    /// provided `assert_fn`.
    ///
    /// Resolves to [`Dropped`] error if the observed [`Store`] goes away
    /// before that.
    ///
    /// [`Future`]: std::future::Future
    pub fn when<F>(
        self: &Rc<Self>,
        assert_fn: F,
    ) -> LocalBoxFuture<'static, Result<(), Dropped>>
    where
        F: Fn(&O) -> bool + 'static,
    {
        if (assert_fn)(&self.get()) {
            return Box::pin(future::ok(()));
        }

        let mut changes = self.changes();
        Box::pin(async move {
            while let Some(value) = changes.next().await {
                if (assert_fn)(&value) {
                    return Ok(());
                }
            }
            Err(Dropped)
        })
    }

    /// Returns [`Future`] resolving once the selected value becomes equal to
    /// the provided `should_be` one.
    ///
    /// [`Future`]: std::future::Future
    #[inline]
    pub fn when_eq(
        self: &Rc<Self>,
        should_be: O,
    ) -> LocalBoxFuture<'static, Result<(), Dropped>> {
        self.when(move |value| value == &should_be)
    }
}

impl<T, O: fmt::Debug> fmt::Debug for Selection<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("is_bound", &(self.store.strong_count() > 0))
            .field("selector", &self.selector)
            .finish()
    }
}

/// [`Stream`] returned from [`Selection::changes`].
struct Changes<T, O> {
    /// Receiver of the selected values.
    rx: mpsc::UnboundedReceiver<Rc<O>>,

    /// Listener feeding the receiver.
    _subscription: Subscription,

    /// [`Selection`] which values are yielded.
    _selection: Rc<Selection<T, O>>,
}

impl<T, O> Stream for Changes<T, O> {
    type Item = Rc<O>;

    #[inline]
    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}
