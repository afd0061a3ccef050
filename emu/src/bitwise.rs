use std::ops::RangeInclusive;

/// Bit helpers for the fixed-width integers the decoders pick apart.
/// Bit indices count from the lsb (right to left).
pub trait Bits: Copy {
    fn get_bit(self, bit_idx: u8) -> bool;

    fn set_bit(&mut self, bit_idx: u8, value: bool);

    /// Extracts the inclusive range of bits and moves it down to bit 0.
    #[must_use]
    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self;

    /// Interprets the lowest `number_of_bits` as a two's complement number
    /// and returns it sign-extended to the full width.
    #[must_use]
    fn sign_extended(self, number_of_bits: u8) -> Self;

    fn get_byte(self, byte_nth: u8) -> u8;
}

macro_rules! impl_bits {
    ($($t:ty),*) => {
        $(
            impl Bits for $t {
                #[inline]
                fn get_bit(self, bit_idx: u8) -> bool {
                    debug_assert!(u32::from(bit_idx) < <$t>::BITS);
                    (self >> bit_idx) & 1 == 1
                }

                #[inline]
                fn set_bit(&mut self, bit_idx: u8, value: bool) {
                    debug_assert!(u32::from(bit_idx) < <$t>::BITS);
                    let mask: $t = 1 << bit_idx;
                    if value {
                        *self |= mask;
                    } else {
                        *self &= !mask;
                    }
                }

                #[inline]
                fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
                    let start = u32::from(*bits_range.start());
                    let length = u32::from(*bits_range.end()) - start + 1;
                    debug_assert!(start + length <= <$t>::BITS);
                    let shifted = self >> start;
                    if length == <$t>::BITS {
                        shifted
                    } else {
                        shifted & ((1 << length) - 1)
                    }
                }

                #[inline]
                fn sign_extended(self, number_of_bits: u8) -> Self {
                    debug_assert!(number_of_bits > 0 && u32::from(number_of_bits) <= <$t>::BITS);
                    let unused = <$t>::BITS - u32::from(number_of_bits);
                    // Move the sign bit to the msb, then shift it back arithmetically.
                    ((self << unused) as <$t as SignedOf>::Signed >> unused) as $t
                }

                #[inline]
                fn get_byte(self, byte_nth: u8) -> u8 {
                    debug_assert!(u32::from(byte_nth) * 8 < <$t>::BITS);
                    (self >> (u32::from(byte_nth) * 8)) as u8
                }
            }
        )*
    };
}

/// Maps an unsigned type to its signed twin, used for arithmetic shifts.
pub trait SignedOf {
    type Signed;
}

impl SignedOf for u8 {
    type Signed = i8;
}

impl SignedOf for u16 {
    type Signed = i16;
}

impl SignedOf for u32 {
    type Signed = i32;
}

impl SignedOf for u64 {
    type Signed = i64;
}

impl_bits!(u8, u16, u32, u64);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::Rng;

    use super::*;

    #[test]
    fn check_get_bit() {
        let value: u32 = 0b1010;
        assert!(!value.get_bit(0));
        assert!(value.get_bit(1));
        assert!(value.get_bit(3));
        assert!(0x8000_0000_u32.get_bit(31));
    }

    #[test]
    fn check_set_bit() {
        let mut value: u16 = 0;
        value.set_bit(15, true);
        assert_eq!(value, 0x8000);
        value.set_bit(15, false);
        value.set_bit(0, true);
        assert_eq!(value, 1);
        value.set_bit(0, false);
        assert_eq!(value, 0);
    }

    #[test]
    fn check_get_bits() {
        let value: u32 = 0xE12F_FF1E;
        assert_eq!(value.get_bits(28..=31), 0xE);
        assert_eq!(value.get_bits(0..=3), 0xE);
        assert_eq!(value.get_bits(4..=27), 0x12F_FF1);
        assert_eq!(value.get_bits(0..=31), value);
    }

    #[test]
    fn check_get_bits_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let value: u32 = rng.r#gen();
            let start: u8 = rng.gen_range(0..32);
            let end: u8 = rng.gen_range(start..32);
            let length = u32::from(end - start) + 1;
            let expected = if length == 32 {
                value
            } else {
                (value >> start) & ((1 << length) - 1)
            };
            assert_eq!(value.get_bits(start..=end), expected);
        }
    }

    #[test]
    fn check_sign_extended() {
        assert_eq!(0b1001_u32.sign_extended(4), 0xFFFF_FFF9);
        assert_eq!(0b0111_u32.sign_extended(4), 0b0111);
        assert_eq!(0x80_u16.sign_extended(8), 0xFF80);
        assert_eq!(0x7FF_u32.sign_extended(11), 0xFFFF_FFFF);
        assert_eq!(0x3FF_u32.sign_extended(11), 0x3FF);
        assert_eq!(0x00FF_FFFF_u32.sign_extended(24), 0xFFFF_FFFF);
    }

    #[test]
    fn check_get_byte() {
        let value: u32 = 0x1234_5678;
        assert_eq!(value.get_byte(0), 0x78);
        assert_eq!(value.get_byte(1), 0x56);
        assert_eq!(value.get_byte(3), 0x12);
        assert_eq!(0xABCD_u16.get_byte(1), 0xAB);
    }
}
