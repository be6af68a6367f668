//! Stack growth guard for recursive passes.
//!
//! Scope resolution, lambda lifting and closure evaluation all recurse once
//! per level of syntactic nesting. Generated or machine-written mappings can
//! nest far deeper than hand-written code, so every recursive entry point
//! goes through [`ensure_sufficient_stack`].
//!
//! On native targets the stack is grown on demand with `stacker`; on WASM
//! the closure is called directly.

/// Grow the stack when less than this much remains (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if the remaining space is below the red zone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Nested {
        Leaf,
        Block(Box<Nested>),
    }

    fn depth(node: &Nested) -> usize {
        ensure_sufficient_stack(|| match node {
            Nested::Leaf => 0,
            Nested::Block(inner) => depth(inner) + 1,
        })
    }

    #[test]
    fn test_deeply_nested_blocks() {
        let mut node = Nested::Leaf;
        for _ in 0..50_000 {
            node = Nested::Block(Box::new(node));
        }
        assert_eq!(depth(&node), 50_000);

        // Recursive drop of the chain would overflow.
        loop {
            match node {
                Nested::Block(inner) => node = *inner,
                Nested::Leaf => break,
            }
        }
    }

    #[test]
    fn test_passes_result_through() {
        let result: Result<u8, String> = ensure_sufficient_stack(|| Err("boom".to_string()));
        assert_eq!(result, Err("boom".to_string()));
    }
}
