//! Immutable snapshot [`Store`] with synchronous change notifications.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

/// Snapshot updater waiting for the current [`Store`] mutation to finish.
type Updater<T> = Box<dyn FnOnce(&Rc<T>) -> Rc<T>>;

/// Listener of the [`Store`] changes.
type Listener = Rc<dyn Fn()>;

/// Identifier of a listener, unique within its [`Store`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct ListenerId(u64);

/// Container holding a single immutable snapshot of some state.
///
/// The snapshot is never mutated in place: [`Store::set_snapshot`] replaces
/// it wholesale and then synchronously notifies all the listeners registered
/// with [`Store::subscribe`], in registration order.
///
/// # Re-entrancy
///
/// [`Store::set_snapshot`] called while another mutation is being applied
/// (from an updater or from a listener) doesn't apply immediately. It is
/// queued and applied, with its own notification pass, as soon as the current
/// pass completes.
pub struct Store<T> {
    /// Current snapshot.
    snapshot: RefCell<Rc<T>>,

    /// Registered listeners in registration order.
    listeners: RefCell<Vec<(ListenerId, Listener)>>,

    /// Last issued [`ListenerId`].
    last_listener_id: Cell<u64>,

    /// Mutations requested while `is_busy` is set.
    pending: RefCell<VecDeque<Updater<T>>>,

    /// Indicator whether some mutation is being applied at the moment.
    is_busy: Cell<bool>,
}

impl<T: 'static> Store<T> {
    /// Creates a new [`Store`] holding the provided initial snapshot.
    #[must_use]
    pub fn new(initial: T) -> Rc<Self> {
        Rc::new(Self {
            snapshot: RefCell::new(Rc::new(initial)),
            listeners: RefCell::new(Vec::new()),
            last_listener_id: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            is_busy: Cell::new(false),
        })
    }

    /// Returns the current snapshot.
    #[inline]
    #[must_use]
    pub fn get_snapshot(&self) -> Rc<T> {
        Rc::clone(&self.snapshot.borrow())
    }

    /// Replaces the current snapshot with the one returned by the provided
    /// `updater` and notifies all listeners.
    ///
    /// If `updater` returns the very same [`Rc`] it was given, then nothing is
    /// replaced and no listener is notified.
    pub fn set_snapshot<F>(&self, updater: F)
    where
        F: FnOnce(&Rc<T>) -> Rc<T> + 'static,
    {
        if self.is_busy.get() {
            self.pending.borrow_mut().push_back(Box::new(updater));
            return;
        }

        self.apply(updater);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(updater) => self.apply(updater),
                None => break,
            }
        }
    }

    /// Registers the provided `listener`, which will be called after every
    /// snapshot replacement.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(self: &Rc<Self>, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let id = ListenerId(self.last_listener_id.get() + 1);
        self.last_listener_id.set(id.0);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));

        let store = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(store) = Weak::upgrade(&store) {
                store.remove_listener(id);
            }
        })
    }

    /// Returns count of the currently registered listeners.
    #[inline]
    #[must_use]
    pub fn listeners_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Applies the provided `updater` and notifies listeners if the snapshot
    /// was really replaced.
    fn apply<F>(&self, updater: F)
    where
        F: FnOnce(&Rc<T>) -> Rc<T>,
    {
        let _busy = BusyGuard::set(&self.is_busy);

        let prev = self.get_snapshot();
        let next = (updater)(&prev);
        if Rc::ptr_eq(&prev, &next) {
            return;
        }
        *self.snapshot.borrow_mut() = next;

        // Listeners added or removed during this pass don't affect it.
        let listeners: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            (listener)();
        }
    }

    /// Removes the listener with the provided [`ListenerId`], if any.
    fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("snapshot", &self.snapshot.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

/// Sets the wrapped flag while alive, unsets it on [`Drop`] (unwinding
/// included).
struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn set(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Handle to a listener registered in a [`Store`].
///
/// The listener is removed on the first [`Subscription::unsubscribe`] call or
/// when this [`Subscription`] is dropped, whichever happens first.
#[must_use = "listener is removed as soon as `Subscription` is dropped"]
pub struct Subscription(RefCell<Option<Box<dyn FnOnce()>>>);

impl Subscription {
    /// Creates a new [`Subscription`] calling `unsubscribe` exactly once.
    fn new<F: FnOnce() + 'static>(unsubscribe: F) -> Self {
        Self(RefCell::new(Some(Box::new(unsubscribe))))
    }

    /// Returns a [`Subscription`] which isn't bound to any listener.
    #[inline]
    pub fn noop() -> Self {
        Self(RefCell::new(None))
    }

    /// Removes the listener of this [`Subscription`].
    ///
    /// Does nothing if it has been removed already.
    pub fn unsubscribe(&self) {
        let unsubscribe = self.0.borrow_mut().take();
        if let Some(unsubscribe) = unsubscribe {
            (unsubscribe)();
        }
    }

    /// Indicates whether the listener of this [`Subscription`] hasn't been
    /// removed yet.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("is_active", &self.is_active())
            .finish()
    }
}
