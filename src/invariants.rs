//! Runtime invariant checks with a per-thread record of what was checked.
//!
//! Stream and session code asserts its lifecycle invariants through
//! [`check_invariant!`]. Tests then call [`require_checked`] to prove that a
//! scenario actually exercised the invariants it claims to cover.
//!
//! ```rust,ignore
//! check_invariant!(self.stream.is_none(), "open starts from a closed stream", "StreamManager::open");
//!
//! #[test]
//! fn contract_stream_lifecycle() {
//!     // ... drive a StreamManager ...
//!     require_checked("stream lifecycle", &["open starts from a closed stream"]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::thread_local;

thread_local! {
    static CHECKED: RefCell<HashSet<&'static str>> = RefCell::new(HashSet::new());
}

/// Assert an invariant and record that it was checked.
///
/// Panics with the invariant text and optional context when the condition
/// is false.
#[macro_export]
macro_rules! check_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariants::__record_invariant($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariants::__record_invariant($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __record_invariant(condition: bool, message: &'static str, context: Option<&str>) {
    CHECKED.with(|checked| {
        checked.borrow_mut().insert(message);
    });

    if !condition {
        panic!(
            "invariant violated [{}]: {}",
            context.unwrap_or("unknown"),
            message
        );
    }
}

/// Invariants checked on this thread so far.
pub fn checked_invariants() -> HashSet<&'static str> {
    CHECKED.with(|checked| checked.borrow().clone())
}

/// Panic unless every invariant in `required` was checked on this thread.
pub fn require_checked(scenario: &str, required: &[&str]) {
    let checked = checked_invariants();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|inv| !checked.contains(inv))
        .collect();

    if !missing.is_empty() {
        panic!(
            "scenario [{}] never checked:\n  - {}",
            scenario,
            missing.join("\n  - ")
        );
    }
}

pub fn reset_checked_invariants() {
    CHECKED.with(|checked| checked.borrow_mut().clear());
}
