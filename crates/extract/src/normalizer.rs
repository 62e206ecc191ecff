/// Normalize entity text into a graph label: lowercase and trimmed.
pub fn normalize_label(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Deduplication key for requirements: first 40 characters of the label.
///
/// Requirement phrases vary a lot at the tail, so matching on a prefix
/// collapses near-identical captures from different passes.
pub fn requirement_key(text: &str) -> String {
    normalize_label(text).chars().take(40).collect()
}

/// Converts regex byte offsets into character offsets for one text.
pub struct OffsetMap {
    /// Byte index of every char boundary; empty when the text is ASCII
    boundaries: Vec<usize>,
}

impl OffsetMap {
    pub fn new(text: &str) -> Self {
        let boundaries = if text.is_ascii() {
            Vec::new()
        } else {
            text.char_indices().map(|(i, _)| i).collect()
        };

        Self { boundaries }
    }

    pub fn char_offset(&self, byte_offset: usize) -> usize {
        if self.boundaries.is_empty() {
            byte_offset
        } else {
            self.boundaries.partition_point(|&b| b < byte_offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_label("  Spar Cap "), "spar cap");
        assert_eq!(normalize_label("NÚCLEO"), "núcleo");
    }

    #[test]
    fn test_requirement_key_truncates_by_chars() {
        let long = "reduce the aerodynamic noise emitted by the trailing edge of the blade";
        assert_eq!(requirement_key(long).chars().count(), 40);
        assert_eq!(requirement_key("Reduce noise"), "reduce noise");
    }

    #[test]
    fn test_offset_map() {
        let ascii = OffsetMap::new("spar cap");
        assert_eq!(ascii.char_offset(5), 5);

        // 'í' is two bytes in UTF-8
        let text = "raíz y punta";
        let map = OffsetMap::new(text);
        let byte = text.find("punta").unwrap();
        assert_eq!(byte, 8);
        assert_eq!(map.char_offset(byte), 7);
        assert_eq!(map.char_offset(0), 0);
    }
}
