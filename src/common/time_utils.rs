// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::time::{SystemTime, UNIX_EPOCH};

/// Return the current UNIX timestamp in seconds.
pub fn current_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Absolute deadline `minutes` from `now`, both in unix seconds.
pub fn deadline_after(now: u64, minutes: u64) -> u64 {
    now.saturating_add(minutes.saturating_mul(60))
}
