//! Rolling checksum for zsync block matching.
//!
//! The rolling checksum is a weak but fast checksum used to identify candidate
//! blocks while scanning a seed file. It allows O(1) sliding-window updates:
//! shifting the window by one byte adjusts two 16-bit accumulators instead of
//! re-reading the whole block.
//!
//! Unlike the rsync flavour of the algorithm, the zsync weighted half is tied
//! to the advertised block size rather than to however many bytes happen to be
//! buffered, so the checksum is constructed for a specific block size and the
//! window is always exactly that long (the caller zero-pads at end of file).

use thiserror::Error;

/// Error raised when re-seeding the rolling window with a slice whose length
/// does not match the block size.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("rolling checksum window requires {want} bytes, received {got}")]
pub struct RollingError {
    /// Number of bytes the caller supplied.
    pub got: usize,
    /// Block size the checksum was constructed for.
    pub want: usize,
}

/// Weak rolling checksum over a fixed-size block window (often called `rsum`).
///
/// The sum is split into two 16-bit halves: `a` accumulates the byte values
/// and `b` accumulates the running prefix sums, both truncated to 16 bits.
/// For a byte `x` leaving the window and `y` entering it:
///
/// ```text
/// a ← a − x + y
/// b ← b − block_size·x + a
/// ```
///
/// # Examples
///
/// ```
/// use checksums::RollingChecksum;
///
/// let data = b"ABCDE";
///
/// let mut rolling = RollingChecksum::new(3);
/// rolling.reset_with(&data[0..3]).unwrap(); // "ABC"
///
/// // Roll window: remove 'A', add 'D' -> now covers "BCD"
/// rolling.roll(data[0], data[3]);
///
/// let mut fresh = RollingChecksum::new(3);
/// fresh.reset_with(&data[1..4]).unwrap(); // "BCD"
/// assert_eq!(rolling.value(), fresh.value());
/// ```
#[doc(alias = "rsum")]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RollingChecksum {
    a: u32,
    b: u32,
    block_size: u32,
}

impl RollingChecksum {
    /// Creates a checksum for windows of `block_size` bytes with zeroed state.
    ///
    /// `block_size` is the value advertised by the control file and is never
    /// zero for a valid control file.
    #[must_use]
    pub const fn new(block_size: u32) -> Self {
        Self {
            a: 0,
            b: 0,
            block_size,
        }
    }

    /// Block size the checksum was constructed for.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Resets the accumulators back to their initial state.
    pub const fn reset(&mut self) {
        self.a = 0;
        self.b = 0;
    }

    /// Feeds additional bytes into the checksum state.
    ///
    /// Splitting the window across several `update` calls is equivalent to a
    /// single call over the concatenated bytes.
    #[inline]
    pub fn update(&mut self, chunk: &[u8]) {
        let mut a = self.a;
        let mut b = self.b;
        for &byte in chunk {
            a = a.wrapping_add(u32::from(byte));
            b = b.wrapping_add(a);
        }
        self.a = a & 0xffff;
        self.b = b & 0xffff;
    }

    /// Clears the state and loads a complete window in one step.
    ///
    /// # Errors
    ///
    /// Returns [`RollingError`] when `window` is not exactly `block_size`
    /// bytes long; callers zero-pad short tail windows before seeding.
    pub fn reset_with(&mut self, window: &[u8]) -> Result<(), RollingError> {
        if window.len() != self.block_size as usize {
            return Err(RollingError {
                got: window.len(),
                want: self.block_size as usize,
            });
        }
        self.reset();
        self.update(window);
        Ok(())
    }

    /// Rolls the checksum by removing the oldest window byte and appending a
    /// new one, in O(1).
    #[inline]
    pub fn roll(&mut self, outgoing: u8, incoming: u8) {
        let out = u32::from(outgoing);
        let inn = u32::from(incoming);

        let a = self.a.wrapping_sub(out).wrapping_add(inn) & 0xffff;
        let b = self
            .b
            .wrapping_sub(self.block_size.wrapping_mul(out))
            .wrapping_add(a)
            & 0xffff;

        self.a = a;
        self.b = b;
    }

    /// Returns the packed 32-bit checksum: `b` in the high half, `a` in the
    /// low half.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// Returns the 16-bit form of the checksum (`a` alone), used for short
    /// table lookups.
    #[inline]
    #[must_use]
    pub const fn half(&self) -> u16 {
        self.a as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn checksum_of(block_size: u32, window: &[u8]) -> u32 {
        let mut rolling = RollingChecksum::new(block_size);
        rolling.reset_with(window).unwrap();
        rolling.value()
    }

    #[test]
    fn known_vector_abcd() {
        // a = 0x61 + 0x62 + 0x63 + 0x64 = 394
        // b = 97 + 195 + 294 + 394 = 980
        assert_eq!(checksum_of(4, b"abcd"), (980 << 16) | 394);
    }

    #[test]
    fn zero_window_is_zero() {
        assert_eq!(checksum_of(8, &[0u8; 8]), 0);
    }

    #[test]
    fn half_is_low_sixteen_bits() {
        let mut rolling = RollingChecksum::new(4);
        rolling.reset_with(b"abcd").unwrap();
        assert_eq!(u32::from(rolling.half()), rolling.value() & 0xffff);
    }

    #[test]
    fn roll_matches_fresh_computation() {
        let data = b"abcde";
        let mut rolling = RollingChecksum::new(4);
        rolling.reset_with(&data[0..4]).unwrap();
        rolling.roll(data[0], data[4]);
        assert_eq!(rolling.value(), checksum_of(4, &data[1..5]));
    }

    #[test]
    fn update_is_splittable() {
        let mut split = RollingChecksum::new(8);
        split.update(b"hell");
        split.update(b"o,ws");

        let mut whole = RollingChecksum::new(8);
        whole.update(b"hello,ws");
        assert_eq!(split.value(), whole.value());
    }

    #[test]
    fn reset_with_rejects_short_window() {
        let mut rolling = RollingChecksum::new(4);
        let err = rolling.reset_with(b"abc").unwrap_err();
        assert_eq!(err, RollingError { got: 3, want: 4 });
    }

    proptest! {
        // Rolling over every position of a buffer stays equal to recomputing
        // the checksum of each shifted window from scratch.
        #[test]
        fn rolling_equals_direct(data in proptest::collection::vec(any::<u8>(), 16..128)) {
            let block_size = 8u32;
            let mut rolling = RollingChecksum::new(block_size);
            rolling.reset_with(&data[..8]).unwrap();

            for start in 1..data.len() - 8 {
                rolling.roll(data[start - 1], data[start + 7]);
                prop_assert_eq!(
                    rolling.value(),
                    checksum_of(block_size, &data[start..start + 8])
                );
            }
        }

        #[test]
        fn state_stays_masked(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut rolling = RollingChecksum::new(2048);
            rolling.update(&data);
            let value = rolling.value();
            prop_assert_eq!(value & 0xffff, u32::from(rolling.half()));
        }
    }
}
