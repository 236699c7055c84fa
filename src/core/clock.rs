//! Process-relative monotonic clock

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed since the first call in this process.
///
/// Readings are stamped with this value; it never goes backwards, which is
/// all the age calculations in [`crate::store`] rely on.
pub fn monotonic_ms() -> u64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_never_decreases() {
        let first = monotonic_ms();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = monotonic_ms();
        assert!(second >= first);
    }
}
