//! Stack growth for recursive tree walks.
//!
//! Query trees come from clients and can nest arbitrarily deep. Every
//! recursive walk over a term tree (annotation, propagation, construction,
//! evaluation) wraps its recursive step in [`ensure_sufficient_stack`], which
//! grows the native stack on demand instead of overflowing it.
//!
//! On WASM targets this is a passthrough.

/// Remaining stack below which a new segment is allocated (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment (1MB).
const NEW_SEGMENT: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, NEW_SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_recursion_does_not_overflow() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }
        assert_eq!(depth(200_000), 200_000);
    }

    #[test]
    fn passes_results_through() {
        let result: Result<u8, &str> = ensure_sufficient_stack(|| Err("boom"));
        assert_eq!(result, Err("boom"));
    }
}
