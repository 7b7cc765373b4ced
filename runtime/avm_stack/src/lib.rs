//! Stack safety for re-entrant property access.
//!
//! Property reads can recurse without a syntactic bound: a getter may read
//! another property, a prototype lookup delegates to the class object, and an
//! equality test may compare the results of two `valueOf` calls. Those paths
//! run inside [`ensure_sufficient_stack`], which grows the stack on demand.
//!
//! - **Native targets**: `stacker` grows the stack when the red zone is hit.
//! - **WASM targets**: no-op passthrough.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
