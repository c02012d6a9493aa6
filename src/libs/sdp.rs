use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

/// Strain Distribution Pattern: one bit per strain giving the allele call
/// at a single SNP. Bit order follows the sorted canonical strain list of
/// the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sdp {
    bits: FixedBitSet,
}

impl Sdp {
    pub fn new(bits: FixedBitSet) -> Self {
        Self { bits }
    }

    /// Build from a 0/1 string, bit 0 first. Convenient for tests.
    ///
    /// # Example
    /// ```
    /// use ham::libs::sdp::Sdp;
    /// let sdp = Sdp::from_binary("0011");
    /// assert_eq!(sdp.count_ones(), 2);
    /// assert!(!sdp.get(0));
    /// assert!(sdp.get(2));
    /// ```
    pub fn from_binary(s: &str) -> Self {
        let mut bits = FixedBitSet::with_capacity(s.len());
        for (i, c) in s.chars().enumerate() {
            if c == '1' {
                bits.set(i, true);
            }
        }
        Self { bits }
    }

    /// Build from projected genotype calls. Returns None when any call is
    /// not exactly 0.0 or 1.0 (heterozygous or missing); such SNPs are
    /// excluded from SDP streams.
    pub fn from_calls(calls: &[f64]) -> Option<Self> {
        let mut bits = FixedBitSet::with_capacity(calls.len());
        for (i, &call) in calls.iter().enumerate() {
            if call == 1.0 {
                bits.set(i, true);
            } else if call != 0.0 {
                return None;
            }
        }
        Some(Self { bits })
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.len() == 0
    }

    pub fn get(&self, i: usize) -> bool {
        self.bits.contains(i)
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn bits(&self) -> &FixedBitSet {
        &self.bits
    }

    /// All-0 or all-1 patterns carry no partition information; they are
    /// compatible with everything.
    pub fn is_constant(&self) -> bool {
        let ones = self.count_ones();
        ones == 0 || ones == self.len()
    }

    pub fn complement(&self) -> Self {
        let mut bits = self.bits.clone();
        bits.toggle_range(..);
        Self { bits }
    }

    /// Canonical representative of the bipartition: the one whose bit 0 is
    /// unset. An SDP and its complement denote the same partition.
    ///
    /// # Example
    /// ```
    /// use ham::libs::sdp::Sdp;
    /// assert_eq!(Sdp::from_binary("1100").canonical(), Sdp::from_binary("0011"));
    /// assert_eq!(Sdp::from_binary("0011").canonical(), Sdp::from_binary("0011"));
    /// ```
    pub fn canonical(&self) -> Self {
        if self.get(0) {
            self.complement()
        } else {
            self.clone()
        }
    }

    /// Four-gamete test. Two SDPs are compatible iff the combinations
    /// (0,0), (0,1), (1,0), (1,1) do not all co-occur across strains.
    pub fn compatible(&self, other: &Sdp) -> bool {
        debug_assert_eq!(self.len(), other.len());
        let mut seen = [false; 4];
        for i in 0..self.len() {
            let gamete = ((self.get(i) as usize) << 1) | other.get(i) as usize;
            seen[gamete] = true;
        }
        !(seen[0] && seen[1] && seen[2] && seen[3])
    }

    /// Render as a 0/1 string, bit 0 leftmost. Used for the `strains`
    /// output column and for lexicographic class ordering.
    pub fn to_binary(&self) -> String {
        (0..self.len())
            .map(|i| if self.get(i) { '1' } else { '0' })
            .collect()
    }
}

/// Iteration direction of an SDP stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// A single-cursor stream of SDPs for one chromosome, already projected
/// onto the active strain subset. Restart by calling `reopen()`.
#[derive(Debug, Clone)]
pub struct SdpStream {
    sdps: std::sync::Arc<Vec<Sdp>>,
    direction: Direction,
    cursor: usize,
}

impl SdpStream {
    pub fn new(sdps: std::sync::Arc<Vec<Sdp>>, direction: Direction) -> Self {
        Self {
            sdps,
            direction,
            cursor: 0,
        }
    }

    /// Number of SNPs the stream will yield; agrees with the paired
    /// SNP-position array regardless of direction.
    pub fn snp_count(&self) -> usize {
        self.sdps.len()
    }

    /// Next SDP, or None at end of chromosome.
    pub fn next_sdp(&mut self) -> Option<&Sdp> {
        if self.cursor >= self.sdps.len() {
            return None;
        }
        let idx = match self.direction {
            Direction::Forward => self.cursor,
            Direction::Reverse => self.sdps.len() - 1 - self.cursor,
        };
        self.cursor += 1;
        Some(&self.sdps[idx])
    }

    /// Fresh stream over the same SDPs, cursor reset.
    pub fn reopen(&self, direction: Direction) -> Self {
        Self::new(self.sdps.clone(), direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_gamete_pairs() {
        let a = Sdp::from_binary("0011");
        let b = Sdp::from_binary("0101");
        let c = Sdp::from_binary("0110");

        assert!(a.compatible(&b));
        assert!(!a.compatible(&c));
        assert!(!b.compatible(&c));
    }

    #[test]
    fn constant_compatible_with_everything() {
        let zero = Sdp::from_binary("0000");
        let one = Sdp::from_binary("1111");
        let any = Sdp::from_binary("0110");

        assert!(zero.is_constant());
        assert!(one.is_constant());
        assert!(zero.compatible(&any));
        assert!(one.compatible(&any));
        assert!(zero.compatible(&one));
    }

    #[test]
    fn complement_preserves_compatibility() {
        let a = Sdp::from_binary("0011");
        let c = Sdp::from_binary("0110");
        assert_eq!(a.compatible(&c), a.complement().compatible(&c));
    }

    #[test]
    fn from_calls_rejects_het_and_missing() {
        assert!(Sdp::from_calls(&[0.0, 1.0, 1.0]).is_some());
        assert!(Sdp::from_calls(&[0.0, 0.5, 1.0]).is_none());
        assert!(Sdp::from_calls(&[0.0, f64::NAN, 1.0]).is_none());
    }

    #[test]
    fn stream_directions_agree_on_count() {
        let sdps = std::sync::Arc::new(vec![
            Sdp::from_binary("0011"),
            Sdp::from_binary("0101"),
            Sdp::from_binary("0110"),
        ]);
        let mut fwd = SdpStream::new(sdps.clone(), Direction::Forward);
        let mut rev = SdpStream::new(sdps, Direction::Reverse);

        assert_eq!(fwd.snp_count(), 3);
        assert_eq!(rev.snp_count(), 3);
        assert_eq!(fwd.next_sdp().unwrap(), &Sdp::from_binary("0011"));
        assert_eq!(rev.next_sdp().unwrap(), &Sdp::from_binary("0110"));
    }
}
