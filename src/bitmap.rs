use bitvec::prelude::*;

/// A fixed-size bit vector.
#[derive(Debug, Clone)]
pub struct Bitmap {
    bits: BitVec,
}

impl Bitmap {
    /// Creates a bitmap of `len` bits, all unset.
    pub fn new(len: usize) -> Self {
        Self {
            bits: bitvec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn reset(&mut self) {
        self.bits.fill(false);
    }

    #[inline]
    pub fn set_bit(&mut self, pos: usize) {
        self.bits.set(pos, true);
    }

    #[inline]
    pub fn get_bit(&self, pos: usize) -> bool {
        self.bits[pos]
    }

    /// Sets the bit and returns its previous value.
    #[inline]
    pub fn test_and_set(&mut self, pos: usize) -> bool {
        self.bits.replace(pos, true)
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn swap(&mut self, other: &mut Bitmap) {
        std::mem::swap(&mut self.bits, &mut other.bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_reset() {
        let mut bmp = Bitmap::new(130);
        assert_eq!(bmp.len(), 130);
        assert!(!bmp.get_bit(0));
        bmp.set_bit(0);
        bmp.set_bit(64);
        bmp.set_bit(129);
        assert!(bmp.get_bit(0) && bmp.get_bit(64) && bmp.get_bit(129));
        assert!(!bmp.get_bit(63));
        assert_eq!(bmp.count_ones(), 3);
        bmp.reset();
        assert_eq!(bmp.count_ones(), 0);
    }

    #[test]
    fn test_test_and_set() {
        let mut bmp = Bitmap::new(16);
        assert!(!bmp.test_and_set(5));
        assert!(bmp.test_and_set(5));
    }

    #[test]
    fn test_word_boundaries() {
        let mut bmp = Bitmap::new(200);
        for &pos in &[63, 64, 127, 128, 199] {
            assert!(!bmp.test_and_set(pos));
        }
        assert!(bmp.get_bit(64) && !bmp.get_bit(65));
        assert_eq!(bmp.count_ones(), 5);
        assert!(Bitmap::new(0).is_empty());
    }

    #[test]
    fn test_swap() {
        let mut front = Bitmap::new(8);
        let mut next = Bitmap::new(8);
        front.set_bit(1);
        next.set_bit(2);
        front.swap(&mut next);
        assert!(front.get_bit(2) && !front.get_bit(1));
        assert!(next.get_bit(1) && !next.get_bit(2));
    }
}
