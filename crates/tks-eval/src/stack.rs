//! Stack growth for deeply nested evaluation.
//!
//! Call depth is capped by [`EvalConfig`](crate::EvalConfig), but nested
//! literals and long operator chains recurse too. On native targets the
//! stack is grown on demand; WASM manages its own stack.

/// Below this much remaining stack, grow before recursing.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
