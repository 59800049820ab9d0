//! Form-style URL encoding for plugin ids.

/// Encode a plugin name so it can be used as a path segment or query value.
///
/// Alphanumerics and `-_.*` pass through, a space becomes `+`, and every
/// other character is percent-encoded byte by byte.
pub fn encode_id(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '*' => result.push(c),
            ' ' => result.push('+'),
            _ => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    result.push_str(&format!("%{:02X}", b));
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(encode_id("commit-message-length-validator"), "commit-message-length-validator");
        assert_eq!(encode_id("a_b.c*"), "a_b.c*");
    }

    #[test]
    fn test_reserved_characters() {
        assert_eq!(encode_id("a/b"), "a%2Fb");
        assert_eq!(encode_id("x y"), "x+y");
        assert_eq!(encode_id("a~b"), "a%7Eb");
    }

    #[test]
    fn test_multibyte() {
        assert_eq!(encode_id("é"), "%C3%A9");
    }
}
