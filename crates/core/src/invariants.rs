//! Log ordering checks
//!
//! Stores assert their own invariants in debug builds. Clients only flag
//! violations in what they receive; they never reorder or repair a snapshot.

use crate::models::ChatMessage;

/// First adjacent pair `(previous, next)` whose ids are not strictly increasing
pub fn find_order_violation(messages: &[ChatMessage]) -> Option<(u64, u64)> {
    messages
        .windows(2)
        .find(|pair| pair[1].id <= pair[0].id)
        .map(|pair| (pair[0].id, pair[1].id))
}

/// Validate that a log produced by a store is strictly ascending by id
pub fn assert_log_invariants(messages: &[ChatMessage]) {
    debug_assert!(
        find_order_violation(messages).is_none(),
        "Log is not strictly ascending: {:?}",
        find_order_violation(messages)
    );
}

/// Validate that a newly appended message follows the previous one
pub fn assert_append_invariants(previous: Option<&ChatMessage>, appended: &ChatMessage) {
    debug_assert!(appended.id != 0, "Appended message has id 0");

    if let Some(prev) = previous {
        debug_assert!(
            appended.id > prev.id,
            "Appended id {} does not follow {}",
            appended.id,
            prev.id
        );
    }
}
