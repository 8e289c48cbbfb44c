// SyntaxLang native stack guard
// Evaluation recurses once per nested node and per call; the stack is grown
// on demand so that `max_call_depth` is reached before the native stack ends.

/// Free stack to keep before descending further
const RED_ZONE: usize = 128 * 1024;

/// Size of each extra stack segment
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
