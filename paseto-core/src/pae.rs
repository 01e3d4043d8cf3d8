//! Pre-auth encoding
//!
//! `LE64(n) ‖ LE64(len(p0)) ‖ p0 ‖ … ‖ LE64(len(pn-1)) ‖ pn-1`
//!
//! The length prefixes make the encoding injective: moving bytes across a part
//! boundary always changes the output, so a signature over the encoding cannot
//! be replayed against a different header/payload/footer split.

/// A sink for encoded bytes, e.g. a buffer or a running MAC.
pub trait WriteBytes {
    fn write(&mut self, slice: &[u8]);
}

impl<W: WriteBytes> WriteBytes for &mut W {
    fn write(&mut self, slice: &[u8]) {
        W::write(self, slice)
    }
}

impl WriteBytes for Vec<u8> {
    fn write(&mut self, slice: &[u8]) {
        self.extend_from_slice(slice)
    }
}

/// Stream the encoding of `parts` into `out`.
pub fn pre_auth_encode(parts: &[&[u8]], mut out: impl WriteBytes) {
    let len = parts.len() as u64;
    out.write(&len.to_le_bytes());
    for part in parts {
        let len = part.len() as u64;
        out.write(&len.to_le_bytes());
        out.write(part);
    }
}

/// Encode `parts` into a fresh buffer.
pub fn pae(parts: &[&[u8]]) -> Vec<u8> {
    let cap = 8 + parts.iter().map(|p| 8 + p.len()).sum::<usize>();
    let mut out = Vec::with_capacity(cap);
    pre_auth_encode(parts, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::pae;

    #[test]
    fn known_answers() {
        assert_eq!(pae(&[]), b"\x00\x00\x00\x00\x00\x00\x00\x00");

        assert_eq!(
            pae(&[b""]),
            b"\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00"
        );

        assert_eq!(
            pae(&[b"test"]),
            b"\x01\x00\x00\x00\x00\x00\x00\x00\x04\x00\x00\x00\x00\x00\x00\x00test"
        );

        let mut expected = Vec::new();
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(&9u64.to_le_bytes());
        expected.extend_from_slice(b"v1.public");
        expected.extend_from_slice(&0u64.to_le_bytes());
        assert_eq!(pae(&[b"v1.public", b""]), expected);
    }

    #[test]
    fn concatenation_is_not_a_split() {
        assert_ne!(pae(&[b"ab", b"c"]), pae(&[b"abc"]));
        assert_ne!(pae(&[b"ab", b"c"]), pae(&[b"a", b"bc"]));
        assert_ne!(pae(&[b"", b"abc"]), pae(&[b"abc", b""]));
        assert_ne!(pae(&[b""]), pae(&[b"", b""]));
    }

    #[test]
    fn every_split_is_distinct() {
        // all ways to cut "abcdef" into up to three ordered parts
        let total = b"abcdef";
        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        for i in 0..=total.len() {
            for j in i..=total.len() {
                let (a, rest) = total.split_at(i);
                let (b, c) = rest.split_at(j - i);
                assert!(seen.insert(pae(&[a, b, c])));
                count += 1;
            }
            let (a, b) = total.split_at(i);
            assert!(seen.insert(pae(&[a, b])));
            count += 1;
        }
        assert!(seen.insert(pae(&[total])));
        assert_eq!(seen.len(), count + 1);
    }
}
