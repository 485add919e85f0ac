//! Per-caller cumulative storage quota
//!
//! The ledger tracks bytes consumed per caller against a single shared
//! maximum. Admission and accounting are one atomic operation:
//! [`QuotaLedger::try_reserve`] checks capacity and claims the bytes under
//! one lock, returning a [`Reservation`] that must be committed after a
//! successful relay. Dropping or releasing the reservation returns the
//! bytes, so a failed relay never leaks usage and two concurrent requests
//! can never both slip past the check.
//!
//! A maximum of zero means unlimited.

use crate::{CoreError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Byte-usage ledger keyed by opaque caller identity.
pub struct QuotaLedger {
    used: Mutex<HashMap<String, u64>>,
    /// Shared per-caller maximum in bytes; zero disables the bound
    max_quota: u64,
}

impl QuotaLedger {
    pub fn new(max_quota: u64) -> Self {
        Self {
            used: Mutex::new(HashMap::new()),
            max_quota,
        }
    }

    pub fn max_quota(&self) -> u64 {
        self.max_quota
    }

    /// Whether a per-caller maximum is enforced at all.
    pub fn is_unlimited(&self) -> bool {
        self.max_quota == 0
    }

    /// Bytes currently attributed to the caller, reservations included.
    pub fn usage(&self, caller: &str) -> u64 {
        self.used.lock().get(caller).copied().unwrap_or(0)
    }

    /// Bytes the caller may still consume, or `None` when unlimited.
    pub fn remaining(&self, caller: &str) -> Option<u64> {
        if self.is_unlimited() {
            return None;
        }
        Some(self.max_quota.saturating_sub(self.usage(caller)))
    }

    /// Atomically check capacity and claim `size` bytes for the caller.
    ///
    /// The returned reservation rolls the claim back on drop unless
    /// [`Reservation::commit`] is called.
    pub fn try_reserve<'a>(&'a self, caller: &str, size: u64) -> Result<Reservation<'a>> {
        if !self.is_unlimited() {
            let mut used = self.used.lock();
            let current = used.get(caller).copied().unwrap_or(0);
            if current + size > self.max_quota {
                return Err(CoreError::QuotaExceeded {
                    used: current,
                    max: self.max_quota,
                    requested: size,
                });
            }
            *used.entry(caller.to_string()).or_insert(0) += size;
        } else if size > 0 {
            // Still account usage so the status endpoint stays meaningful.
            *self.used.lock().entry(caller.to_string()).or_insert(0) += size;
        }
        Ok(Reservation {
            ledger: self,
            caller: caller.to_string(),
            size,
            committed: false,
        })
    }

    fn rollback(&self, caller: &str, size: u64) {
        let mut used = self.used.lock();
        if let Some(current) = used.get_mut(caller) {
            *current = current.saturating_sub(size);
        }
    }
}

/// Claimed quota awaiting the outcome of a relay.
#[must_use = "an uncommitted reservation is rolled back on drop"]
pub struct Reservation<'a> {
    ledger: &'a QuotaLedger,
    caller: String,
    size: u64,
    committed: bool,
}

impl Reservation<'_> {
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Finalize the claim after a successful relay.
    pub fn commit(mut self) {
        self.committed = true;
        debug!(
            caller = %self.caller,
            size = self.size,
            used = self.ledger.usage(&self.caller),
            "quota usage committed"
        );
    }

    /// Return the claimed bytes, e.g. after a relay failure.
    pub fn release(self) {
        // Drop performs the rollback.
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed && self.size > 0 {
            self.ledger.rollback(&self.caller, self.size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_boundary() {
        let ledger = QuotaLedger::new(100);
        ledger.try_reserve("caller", 90).unwrap().commit();

        assert!(matches!(
            ledger.try_reserve("caller", 11),
            Err(CoreError::QuotaExceeded { used: 90, max: 100, .. })
        ));

        ledger.try_reserve("caller", 10).unwrap().commit();
        assert_eq!(ledger.usage("caller"), 100);
        assert!(ledger.try_reserve("caller", 1).is_err());
        // Zero-size reservations still pass at a full quota.
        assert!(ledger.try_reserve("caller", 0).is_ok());
    }

    #[test]
    fn test_release_rolls_back() {
        let ledger = QuotaLedger::new(100);
        let reservation = ledger.try_reserve("caller", 60).unwrap();
        assert_eq!(ledger.usage("caller"), 60);
        reservation.release();
        assert_eq!(ledger.usage("caller"), 0);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let ledger = QuotaLedger::new(100);
        {
            let _reservation = ledger.try_reserve("caller", 60).unwrap();
        }
        assert_eq!(ledger.usage("caller"), 0);
    }

    #[test]
    fn test_concurrent_reservations_cannot_both_pass() {
        let ledger = QuotaLedger::new(100);
        let first = ledger.try_reserve("caller", 60);
        let second = ledger.try_reserve("caller", 60);
        assert!(first.is_ok());
        assert!(second.is_err(), "reserve is atomic, no double admission");
        first.unwrap().commit();
    }

    #[test]
    fn test_zero_max_means_unlimited() {
        let ledger = QuotaLedger::new(0);
        assert!(ledger.is_unlimited());
        ledger.try_reserve("caller", u64::MAX / 2).unwrap().commit();
        assert!(ledger.try_reserve("caller", 1).is_ok());
        assert_eq!(ledger.remaining("caller"), None);
    }

    #[test]
    fn test_callers_are_independent() {
        let ledger = QuotaLedger::new(50);
        ledger.try_reserve("a", 50).unwrap().commit();
        assert!(ledger.try_reserve("a", 1).is_err());
        assert!(ledger.try_reserve("b", 50).is_ok());
    }

    #[test]
    fn test_remaining() {
        let ledger = QuotaLedger::new(100);
        ledger.try_reserve("caller", 30).unwrap().commit();
        assert_eq!(ledger.remaining("caller"), Some(70));
    }
}
