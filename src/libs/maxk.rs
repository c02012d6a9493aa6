use std::collections::VecDeque;

use super::interval::IndexedSnpInterval;
use super::sdp::{Sdp, SdpStream};

/// Scan one chromosome for the maximal SNP intervals admitting a perfect
/// phylogeny.
///
/// Maintains a left pointer `l` and advances the right pointer `r` while
/// the window `[l, r]` stays pairwise four-gamete compatible. On failure
/// the maximal interval ending at `r - 1` is emitted and `l` jumps past
/// the rightmost conflicting column. Only the live window is buffered, so
/// the full SDP matrix is never materialised.
///
/// The output is sorted by start index and non-nested: both endpoints
/// strictly increase from one interval to the next.
pub fn scan_max_k_intervals(stream: &mut SdpStream) -> Vec<IndexedSnpInterval> {
    let n = stream.snp_count();
    let mut intervals = Vec::new();
    if n == 0 {
        return intervals;
    }

    let mut l = 0usize;
    let mut window: VecDeque<Sdp> = VecDeque::new();

    for r in 0..n {
        let sdp = stream
            .next_sdp()
            .expect("stream shorter than its snp_count")
            .clone();

        // rightmost column in [l, r) that breaks compatibility with r
        let mut new_l = l;
        for (offset, prev) in window.iter().enumerate() {
            if !prev.compatible(&sdp) {
                new_l = l + offset + 1;
            }
        }

        if new_l > l {
            intervals.push(IndexedSnpInterval::new(l, r - l));
            for _ in l..new_l {
                window.pop_front();
            }
            l = new_l;
        }
        window.push_back(sdp);
    }

    intervals.push(IndexedSnpInterval::new(l, n - l));
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::sdp::Direction;
    use std::sync::Arc;

    fn stream_of(patterns: &[&str]) -> SdpStream {
        let sdps: Vec<Sdp> = patterns.iter().map(|p| Sdp::from_binary(p)).collect();
        SdpStream::new(Arc::new(sdps), Direction::Forward)
    }

    #[test]
    fn empty_chromosome() {
        let mut stream = stream_of(&[]);
        assert!(scan_max_k_intervals(&mut stream).is_empty());
    }

    #[test]
    fn incompatible_triple_splits() {
        // 0011 and 0101 are compatible; 0110 conflicts with both
        let mut stream = stream_of(&["0011", "0101", "0110"]);
        let intervals = scan_max_k_intervals(&mut stream);

        assert_eq!(
            intervals,
            vec![
                IndexedSnpInterval::new(0, 2),
                IndexedSnpInterval::new(2, 1),
            ]
        );
    }

    #[test]
    fn fully_compatible_chromosome_is_one_interval() {
        let mut stream = stream_of(&["0011", "0001", "0111", "0011"]);
        let intervals = scan_max_k_intervals(&mut stream);
        assert_eq!(intervals, vec![IndexedSnpInterval::new(0, 4)]);
    }

    #[test]
    fn constant_sdps_extend_any_interval() {
        let mut stream = stream_of(&["0011", "0000", "1111", "0101", "0110", "0000"]);
        let intervals = scan_max_k_intervals(&mut stream);

        assert_eq!(
            intervals,
            vec![
                IndexedSnpInterval::new(0, 4),
                IndexedSnpInterval::new(4, 2),
            ]
        );
    }

    #[test]
    fn emitted_intervals_are_maximal() {
        let patterns = ["0011", "0101", "0110", "0110", "0011", "0111"];
        let sdps: Vec<Sdp> = patterns.iter().map(|p| Sdp::from_binary(p)).collect();
        let mut stream = stream_of(&patterns);
        let intervals = scan_max_k_intervals(&mut stream);

        let pairwise_compatible = |lo: usize, hi: usize| -> bool {
            (lo..=hi).all(|i| (i..=hi).all(|j| sdps[i].compatible(&sdps[j])))
        };

        for (k, iv) in intervals.iter().enumerate() {
            let lo = iv.start_index;
            let hi = iv.end_index();
            assert!(pairwise_compatible(lo, hi));
            if lo > 0 {
                assert!(!pairwise_compatible(lo - 1, hi));
            }
            if hi + 1 < sdps.len() {
                assert!(!pairwise_compatible(lo, hi + 1));
            }
            if k > 0 {
                assert!(intervals[k - 1].start_index < lo);
                assert!(intervals[k - 1].end_index() < hi);
            }
        }
    }
}
