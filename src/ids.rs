/// Small helpers for the human-readable identifiers the store hands out
/// (session ids, order numbers, storage object names).

use chrono::Utc;
use uuid::Uuid;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase base36 string of exactly `len` characters
pub(crate) fn random_base36(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        // A v4 uuid carries 122 random bits, plenty for 20 base36 digits
        let mut value = Uuid::new_v4().as_u128();
        for _ in 0..20 {
            if out.len() == len {
                break;
            }
            out.push(BASE36[(value % 36) as usize] as char);
            value /= 36;
        }
    }
    out
}

/// Milliseconds since the Unix epoch
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Seconds since the Unix epoch (used for `created_at` columns)
pub(crate) fn now_seconds() -> i64 {
    Utc::now().timestamp()
}
