use crate::ChangeId;
use sha1::{Digest, Sha1};
use std::sync::atomic::{AtomicBool, Ordering};

const PREFIX: &str = "POWv0";

/// Number of nonces tried between cancellation checks, so mining never blocks a long time after
/// a caller asks it to stop.
const YIELD_EVERY: u64 = 4096;

fn digest15(change_id: &str, nonce: u64) -> u64 {
    let mut hasher = Sha1::new();
    hasher.update(change_id.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    let digest = hasher.finalize();
    let hex = hex::encode(digest);
    u64::from_str_radix(&hex[..15], 16).expect("15 hex nibbles always fit in a u64")
}

fn threshold(difficulty: u32) -> u64 {
    1u64 << (60 - difficulty)
}

/// Mines a proof-of-work string for `change_id` at the given `difficulty`, trying nonces from 0
/// until `int(sha1(change_id||nonce)[:15 hex], 16) < 2^(60 - difficulty)`.
pub fn calculate_pow(change_id: &ChangeId, difficulty: u32) -> String {
    calculate_pow_cancellable(change_id, difficulty, &AtomicBool::new(false))
        .expect("mining without a cancellation flag never returns None")
}

/// Same as [`calculate_pow`], but checks `cancel` periodically and returns `None` if it was set,
/// so a caller can drop a pending change without the miner running forever.
pub fn calculate_pow_cancellable(
    change_id: &ChangeId,
    difficulty: u32,
    cancel: &AtomicBool,
) -> Option<String> {
    let bound = threshold(difficulty);
    let mut nonce: u64 = 0;
    loop {
        let d = digest15(change_id.as_str(), nonce);
        if d < bound {
            return Some(format!("{PREFIX}${nonce}${d:015x}"));
        }
        nonce += 1;
        if nonce % YIELD_EVERY == 0 && cancel.load(Ordering::Relaxed) {
            return None;
        }
    }
}

/// Recomputes the real proof-of-work digest for `pow` against `change_id` and returns the
/// difficulty it satisfies: `60 - log2(int(digest15, 16))`.
///
/// The digest embedded in the `pow` string itself is never trusted for this calculation — it is
/// only used to recover the mined `nonce` — because trusting a caller-supplied digest would let
/// anyone claim arbitrary difficulty without doing the work.
pub fn get_pow_difficulty(change_id: &ChangeId, pow: &str) -> Option<f64> {
    let mut parts = pow.splitn(3, '$');
    let (prefix, nonce, _claimed_digest) = match (parts.next(), parts.next(), parts.next()) {
        (Some(p), Some(n), Some(d)) => (p, n, d),
        _ => return None,
    };
    if prefix != PREFIX {
        return None;
    }
    let nonce: u64 = nonce.parse().ok()?;
    let d = digest15(change_id.as_str(), nonce);
    if d == 0 {
        return Some(60.0);
    }
    Some(60.0 - (d as f64).log2())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mined_pow_meets_requested_difficulty() {
        for difficulty in 2..10 {
            for i in 0..5u32 {
                let change_id = ChangeId::new(format!("{:064x}", i));
                let pow = calculate_pow(&change_id, difficulty);
                let bits = get_pow_difficulty(&change_id, &pow).unwrap();
                assert!(bits >= difficulty as f64, "{bits} < {difficulty} for {pow}");
            }
        }
    }

    proptest! {
        /// Property 4: PoW monotonicity — whatever difficulty a caller mines at, the recovered
        /// difficulty of what `calculate_pow` produced is never below what was requested.
        #[test]
        fn pow_monotonicity(change_id_seed in any::<u64>(), difficulty in 0u32..12) {
            let change_id = ChangeId::new(format!("{change_id_seed:064x}"));
            let pow = calculate_pow(&change_id, difficulty);
            let bits = get_pow_difficulty(&change_id, &pow).unwrap();
            prop_assert!(bits >= difficulty as f64, "{} < {} for {}", bits, difficulty, pow);
        }
    }

    #[test]
    fn cancellation_stops_mining() {
        let change_id = ChangeId::new("0".repeat(64));
        let cancel = AtomicBool::new(true);
        // A cancel flag set before mining starts should return almost immediately with None,
        // unless nonce 0 happens to already satisfy an absurdly low difficulty.
        let result = calculate_pow_cancellable(&change_id, 59, &cancel);
        assert!(result.is_none() || get_pow_difficulty(&change_id, &result.unwrap()).unwrap() >= 59.0);
    }

    #[test]
    fn forged_digest_is_not_trusted() {
        let change_id = ChangeId::new("a".repeat(64));
        let forged = format!("{PREFIX}$0$000000000000000");
        let bits = get_pow_difficulty(&change_id, &forged).unwrap();
        let real = digest15(change_id.as_str(), 0);
        assert_eq!(bits, 60.0 - (real as f64).log2());
    }
}
