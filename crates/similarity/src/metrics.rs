use std::collections::{BTreeMap, BTreeSet};

/// `|A ∩ B| / |A ∪ B|`; 0 when both sets are empty
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }

    a.intersection(b).count() as f64 / union as f64
}

/// Cosine over sparse count maps; a missing key counts as 0.
///
/// Keys are visited as a sorted union so `cosine(a, b)` and `cosine(b, a)`
/// perform the same floating point operations.
pub fn cosine<K: Ord>(a: &BTreeMap<K, usize>, b: &BTreeMap<K, usize>) -> f64 {
    let keys: BTreeSet<&K> = a.keys().chain(b.keys()).collect();

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for key in keys {
        let x = a.get(key).copied().unwrap_or(0) as f64;
        let y = b.get(key).copied().unwrap_or(0) as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn relative_diff(a: usize, b: usize) -> f64 {
    let max = a.max(b);
    if max == 0 {
        0.0
    } else {
        a.abs_diff(b) as f64 / max as f64
    }
}

/// `1 - (node_diff + edge_diff) / 2` with each diff relative to the larger graph
pub fn size_similarity(nodes: (usize, usize), edges: (usize, usize)) -> f64 {
    1.0 - (relative_diff(nodes.0, nodes.1) + relative_diff(edges.0, edges.1)) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaccard() {
        let a: BTreeSet<_> = ["spar", "web", "tip"].into_iter().collect();
        let b: BTreeSet<_> = ["spar", "root"].into_iter().collect();

        assert!((jaccard(&a, &b) - 0.25).abs() < 1e-12);
        assert_eq!(jaccard(&BTreeSet::<&str>::new(), &BTreeSet::new()), 0.0);
    }

    #[test]
    fn test_cosine_handles_missing_keys() {
        let a: BTreeMap<_, _> = [("R", 1), ("S", 2)].into_iter().collect();
        let b: BTreeMap<_, _> = [("S", 4)].into_iter().collect();

        let expected = 8.0 / (5.0_f64.sqrt() * 4.0);
        assert!((cosine(&a, &b) - expected).abs() < 1e-12);
        assert_eq!(cosine(&a, &b), cosine(&b, &a));
        assert_eq!(cosine(&a, &BTreeMap::new()), 0.0);
    }

    #[test]
    fn test_size_similarity() {
        assert_eq!(size_similarity((10, 10), (4, 4)), 1.0);
        assert_eq!(size_similarity((0, 0), (0, 0)), 1.0);
        // node diff 0.5, edge diff 1.0
        assert!((size_similarity((10, 5), (2, 0)) - 0.25).abs() < 1e-12);
    }
}
