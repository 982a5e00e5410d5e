use std::fmt;

/// The number of picoMOB in one MOB.
pub const PICO_MOB_PER_MOB: u64 = 1_000_000_000_000;

/// The spendable value of an account, in picoMOB, as of a given block count.
///
/// A `Balance` is never stored independently: it is always recomputed from the set of
/// owned outputs that are not known to be spent. The sum of `u64` output values is held
/// in a `u128`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    value: u128,
    block_count: u64,
}

impl Balance {
    /// Constructs a balance from its constituent parts.
    pub const fn from_parts(value: u128, block_count: u64) -> Self {
        Balance { value, block_count }
    }

    /// Sums the given output values into a balance as of `block_count`.
    pub fn from_values<I: IntoIterator<Item = u64>>(values: I, block_count: u64) -> Self {
        Balance {
            value: values.into_iter().map(u128::from).sum(),
            block_count,
        }
    }

    /// Returns the total value in picoMOB.
    pub fn value(&self) -> u128 {
        self.value
    }

    /// Returns the number of blocks of the ledger that this balance reflects.
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Returns the value split into `(whole MOB, remaining picoMOB)`.
    pub fn mob_parts(&self) -> (u128, u64) {
        let per_mob = u128::from(PICO_MOB_PER_MOB);
        // The remainder is strictly less than `PICO_MOB_PER_MOB`, so it fits in a u64.
        (self.value / per_mob, (self.value % per_mob) as u64)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mob, pico) = self.mob_parts();
        write!(f, "{}.{:012} MOB @ block {}", mob, pico, self.block_count)
    }
}
