//! Chat message grouping.
//!
//! Consecutive messages from one sender that are close in time render as a
//! single visual block: the sender name on the first message, the avatar
//! and timestamp on the last.

use serde::Serialize;
use std::ops::Range;

use crate::models::Message;

/// Maximum gap (in milliseconds) between two messages of the same group.
/// A gap of exactly five minutes still groups; one millisecond more splits.
pub const GROUP_TIME_GAP_MS: i64 = 300_000;

/// Display flags for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingResult {
    pub show_avatar: bool,
    pub show_name: bool,
    pub show_timestamp: bool,
    pub is_first_in_group: bool,
    pub is_last_in_group: bool,
}

/// Whether the time between two messages breaks a group. A message
/// without a usable time is always a boundary.
fn gap_exceeded(a: &Message, b: &Message) -> bool {
    match (a.time_ms(), b.time_ms()) {
        (Some(ta), Some(tb)) => ta.abs_diff(tb) > GROUP_TIME_GAP_MS as u64,
        _ => true,
    }
}

fn continues_group(prev: &Message, next: &Message) -> bool {
    prev.sender_id == next.sender_id && !gap_exceeded(prev, next)
}

/// Display flags for `messages[index]`, or `None` if `index` is out of range.
pub fn grouping_for(messages: &[Message], current_user_id: &str, index: usize) -> Option<GroupingResult> {
    let msg = messages.get(index)?;
    let prev = index.checked_sub(1).and_then(|i| messages.get(i));
    let next = messages.get(index + 1);

    let is_first_in_group = prev.map_or(true, |p| !continues_group(p, msg));
    let is_last_in_group = next.map_or(true, |n| !continues_group(msg, n));
    let gap_to_next = next.is_some_and(|n| gap_exceeded(msg, n));
    let is_own = msg.sender_id == current_user_id;

    Some(GroupingResult {
        show_avatar: is_last_in_group && !is_own,
        show_name: is_first_in_group && !is_own,
        show_timestamp: is_last_in_group || gap_to_next,
        is_first_in_group,
        is_last_in_group,
    })
}

/// Display flags for every message, in order.
pub fn grouping_all(messages: &[Message], current_user_id: &str) -> Vec<GroupingResult> {
    (0..messages.len())
        .filter_map(|i| grouping_for(messages, current_user_id, i))
        .collect()
}

/// Index ranges of the visual groups, in order.
pub fn group_runs(messages: &[Message]) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for (i, msg) in messages.iter().enumerate() {
        let extends = i > 0 && continues_group(&messages[i - 1], msg);
        match runs.last_mut() {
            Some(run) if extends => run.end = i + 1,
            _ => runs.push(i..i + 1),
        }
    }
    runs
}
