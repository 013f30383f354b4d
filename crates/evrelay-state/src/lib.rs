pub mod charge;
pub mod malfunction;

pub use charge::{ChargeSnapshot, ChargeState, LowBattery, StatusOutcome, DEFAULT_CLEAR_AFTER};
pub use malfunction::MalfunctionFlag;

use std::sync::{Mutex, MutexGuard};

// A panic while holding one of these locks leaves plain-old-data behind, so
// the guard is recovered instead of propagating the poison.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
