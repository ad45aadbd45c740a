//! Byte-string helpers in the style of their C namesakes.

pub fn substr(s: &[u8], offset: usize, length: usize) -> &[u8] {
    &s[offset..offset + length]
}

pub fn strpos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if pattern.is_empty() {
        return Some(offset);
    }

    if offset + pattern.len() > s.len() {
        return None;
    }

    memchr::memmem::find(&s[offset..], pattern).map(|at| offset + at)
}

/// Case-insensitive `strpos` for ASCII patterns.
pub fn stripos(s: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    let p_len = pattern.len();

    if p_len == 0 {
        return Some(offset);
    }

    if offset + p_len > s.len() {
        return None;
    }

    let p_end = pattern[p_len - 1];

    for at in offset..=(s.len() - p_len) {
        let c = s[at + p_len - 1];

        if !p_end.eq_ignore_ascii_case(&c) {
            continue;
        }

        if pattern.eq_ignore_ascii_case(&s[at..at + p_len]) {
            return Some(at);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strpos_finds_pattern_at_end_of_input() {
        assert_eq!(strpos(b"abcdef", b"def", 0), Some(3));
        assert_eq!(strpos(b"abcdef", b"def", 3), Some(3));
        assert_eq!(strpos(b"abcdef", b"def", 4), None);
        assert_eq!(strpos(b"abcdef", b"xyz", 0), None);
    }

    #[test]
    fn stripos_ignores_ascii_case() {
        assert_eq!(stripos(b"<P>text</P>", b"</p>", 0), Some(7));
        assert_eq!(stripos(b"no closer here", b"</p>", 0), None);
    }
}
