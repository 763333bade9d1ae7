//! Memoization of selector results.

use std::{cell::RefCell, fmt, rc::Rc};

/// Selector function wrapped by [`Memoized`].
type Selector<T, O> = Box<dyn Fn(Option<&T>) -> O>;

/// Wrapper around a selector function, which returns the previously returned
/// [`Rc`] whenever a newly computed result is equal to it.
///
/// Equality is the [`PartialEq`] implementation of `O`. This keeps identity of
/// results stable for unchanged data, so consumers may skip any work with a
/// cheap [`Rc::ptr_eq`] check.
pub struct Memoized<T, O> {
    /// Wrapped selector function.
    selector: Selector<T, O>,

    /// Last returned result.
    last: RefCell<Option<Rc<O>>>,
}

impl<T, O: PartialEq> Memoized<T, O> {
    /// Wraps the provided `selector` function.
    pub fn new<S>(selector: S) -> Self
    where
        S: Fn(Option<&T>) -> O + 'static,
    {
        Self {
            selector: Box::new(selector),
            last: RefCell::new(None),
        }
    }

    /// Calls the wrapped selector with the provided `input`.
    ///
    /// The first call always returns a new [`Rc`].
    pub fn select(&self, input: Option<&T>) -> Rc<O> {
        let result = (self.selector)(input);

        let mut last = self.last.borrow_mut();
        if let Some(prev) = last.as_ref() {
            if **prev == result {
                return Rc::clone(prev);
            }
        }
        let result = Rc::new(result);
        *last = Some(Rc::clone(&result));
        result
    }

    /// Returns the last returned result, if any.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<Rc<O>> {
        self.last.borrow().clone()
    }

    /// Forgets the last returned result, so the next [`Memoized::select`]
    /// call returns a new [`Rc`].
    #[inline]
    pub fn reset(&self) {
        self.last.borrow_mut().take();
    }
}

impl<T, O: fmt::Debug> fmt::Debug for Memoized<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("last", &self.last.borrow())
            .finish()
    }
}
