//! Fixed-capacity inline strings.

use std::fmt;

/// A UTF-8 string stored inline in `N` bytes, holding at most `N - 1` bytes
/// of text.
///
/// Longer input is truncated on a char boundary. Unused bytes are always
/// zero, so the derived comparisons agree with comparing the text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name<const N: usize> {
    bytes: [u8; N],
    len: u8,
}

impl<const N: usize> Name<N> {
    /// Empty name.
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(N > 0 && N <= 256, "Name capacity must be in 1..=256") };
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Largest text length in bytes.
    #[must_use]
    pub const fn capacity() -> usize {
        N - 1
    }

    /// Text length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only whole chars are ever copied in.
        std::str::from_utf8(&self.bytes[..self.len()]).unwrap_or_default()
    }

    /// Replace the text, truncating to [`capacity`](Self::capacity) bytes.
    /// Returns `true` if nothing was cut.
    pub fn assign(&mut self, text: &str) -> bool {
        let mut end = text.len().min(Self::capacity());
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        self.clear();
        self.bytes[..end].copy_from_slice(&text.as_bytes()[..end]);
        self.len = end as u8;
        end == text.len()
    }

    /// Fill the whole capacity with copies of `value`.
    pub fn fill(&mut self, value: char) {
        let mut buffer = [0; 4];
        let encoded = value.encode_utf8(&mut buffer).as_bytes();
        let count = Self::capacity() / encoded.len();

        self.clear();
        for chunk in self.bytes.chunks_exact_mut(encoded.len()).take(count) {
            chunk.copy_from_slice(encoded);
        }
        self.len = (count * encoded.len()) as u8;
    }

    pub fn clear(&mut self) {
        self.bytes = [0; N];
        self.len = 0;
    }
}

impl<const N: usize> Default for Name<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> From<&str> for Name<N> {
    fn from(text: &str) -> Self {
        let mut name = Self::new();
        if !name.assign(text) {
            tracing::trace!(text, capacity = Self::capacity(), "name truncated");
        }
        name
    }
}

impl<const N: usize> PartialEq<str> for Name<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for Name<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> AsRef<str> for Name<N> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> fmt::Display for Name<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for Name<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_fits() {
        let name = Name::<8>::from("counter");
        assert_eq!(name, "counter");
        assert_eq!(name.len(), 7);
        assert_eq!(Name::<8>::capacity(), 7);
    }

    #[test]
    fn test_long_text_is_truncated() {
        let name = Name::<8>::from("generator");
        assert_eq!(name.as_str(), "generat");

        let mut name = Name::<4>::new();
        assert!(!name.assign("abcdef"));
        assert_eq!(name, "abc");
        assert!(name.assign("ab"));
        assert_eq!(name, "ab");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 'é' is two bytes; the third byte of capacity would split it.
        let name = Name::<4>::from("aéé");
        assert_eq!(name.as_str(), "aé");

        let name = Name::<3>::from("€");
        assert!(name.is_empty());
    }

    #[test]
    fn test_fill_and_clear() {
        let mut name = Name::<6>::new();
        name.fill('x');
        assert_eq!(name, "xxxxx");

        name.fill('é');
        assert_eq!(name, "éé");

        name.clear();
        assert!(name.is_empty());
        assert_eq!(name, Name::default());
    }

    #[test]
    fn test_ordering_matches_text() {
        let a = Name::<8>::from("ab");
        let b = Name::<8>::from("abc");
        let c = Name::<8>::from("b");
        assert!(a < b);
        assert!(b < c);

        let mut reassigned = Name::<8>::from("abcdef");
        reassigned.assign("ab");
        assert_eq!(reassigned, a);
    }

    #[test]
    fn test_formatting() {
        let name = Name::<8>::from("view");
        assert_eq!(name.to_string(), "view");
        assert_eq!(format!("{name:?}"), "\"view\"");
    }
}
