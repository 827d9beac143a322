use std::cmp;
use std::fmt;
use std::ops::*;

/// size in bytes
pub type ByteSize = usize;
/// offset in byte
pub type ByteOffset = isize;

/// `Address` represents an arbitrary address within a single layer's own
/// space. This is designed to represent addresses and do address
/// arithmetic in a safe way; two `Address` values from different layers
/// are not meaningfully comparable, and callers are responsible for
/// keeping them scoped to the layer they came from.
#[repr(C)]
#[derive(Copy, Clone, Eq, Hash, Default)]
pub struct Address(pub usize);

/// Address + ByteSize (positive)
impl Add<ByteSize> for Address {
    type Output = Address;
    fn add(self, offset: ByteSize) -> Address {
        Address(self.0 + offset)
    }
}

/// Address += ByteSize (positive)
impl AddAssign<ByteSize> for Address {
    fn add_assign(&mut self, offset: ByteSize) {
        self.0 += offset;
    }
}

/// Address + ByteOffset (positive or negative)
impl Add<ByteOffset> for Address {
    type Output = Address;
    fn add(self, offset: ByteOffset) -> Address {
        Address((self.0 as isize + offset) as usize)
    }
}

/// Address - ByteSize (positive)
impl Sub<ByteSize> for Address {
    type Output = Address;
    fn sub(self, offset: ByteSize) -> Address {
        Address(self.0 - offset)
    }
}

/// Address - Address (the first address must not be smaller than the second)
impl Sub<Address> for Address {
    type Output = ByteSize;
    fn sub(self, other: Address) -> ByteSize {
        debug_assert!(
            self.0 >= other.0,
            "for (addr_a - addr_b), a needs to be at least as large as b"
        );
        self.0 - other.0
    }
}

impl Address {
    /// the zero address
    pub const ZERO: Address = Address(0);

    #[inline(always)]
    pub const fn from_usize(raw: usize) -> Address {
        Address(raw)
    }

    /// is this address zero?
    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// a bitmask covering all significant bits of this address, i.e.
    /// `(1 << ceil(log2(self))) - 1`. Used to compute a layer's
    /// `address_mask` from its `maximum_address`.
    pub fn address_mask(&self) -> usize {
        if self.0 == 0 {
            return 0;
        }
        let bits = (usize::BITS - (self.0 - 1).leading_zeros()).max(1);
        (1usize << bits) - 1
    }

    /// is this address aligned to the given alignment
    pub fn is_aligned_to(&self, align: usize) -> bool {
        self.0 % align == 0
    }

    /// converts the Address to a pointer-sized integer
    #[inline(always)]
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// allows comparison between Address
impl PartialOrd for Address {
    #[inline(always)]
    fn partial_cmp(&self, other: &Address) -> Option<cmp::Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl Ord for Address {
    #[inline(always)]
    fn cmp(&self, other: &Address) -> cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// allows equal test between Address
impl PartialEq for Address {
    #[inline(always)]
    fn eq(&self, other: &Address) -> bool {
        self.0 == other.0
    }
}

impl From<usize> for Address {
    fn from(v: usize) -> Self {
        Address(v)
    }
}

impl From<Address> for usize {
    fn from(a: Address) -> Self {
        a.0
    }
}

/// allows print Address as upper-case hex value
impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

/// allows print Address as lower-case hex value
impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// allows Display format the Address (as lower-case hex value with 0x prefix)
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// allows Debug format the Address (as lower-case hex value with 0x prefix)
impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Address::from_usize(0x1000);
        assert_eq!(a + 0x10usize, Address::from_usize(0x1010));
        assert_eq!((a + 0x10usize) - a, 0x10);
    }

    #[test]
    fn address_mask_matches_spec_examples() {
        assert_eq!(Address::from_usize(0xFFFF).address_mask(), 0xFFFF);
        assert_eq!(Address::from_usize(0x1_0000).address_mask(), 0xFFFF);
        assert_eq!(Address::from_usize(1).address_mask(), 1);
    }

    #[test]
    fn ordering() {
        let a = Address::from_usize(10);
        let b = Address::from_usize(20);
        assert!(a < b);
    }
}
