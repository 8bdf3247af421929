//! The failure currently being handled on this thread.
//!
//! A handler that catches an execution failure and then calls into the
//! regeneration step can wrap that call in [`handling`]. For the dynamic
//! extent of the closure, [`current`] returns the failure's full trace.
//! Scopes nest; the innermost wins.

use std::cell::RefCell;

use tb_core::{render_full_trace, Traced};

thread_local! {
    static HANDLING: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        HANDLING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` while `failure` is the failure being handled.
pub fn handling<T>(failure: &dyn Traced, f: impl FnOnce() -> T) -> T {
    let trace = render_full_trace(failure);
    HANDLING.with(|stack| stack.borrow_mut().push(trace));
    let _guard = ScopeGuard;
    f()
}

/// Trace of the innermost failure being handled, if any.
pub fn current() -> Option<String> {
    HANDLING.with(|stack| stack.borrow().last().cloned())
}
