/// Decode backslash escapes in a command-line pattern or replacement.
///
/// Supports `\\`, `\a`, `\b`, `\f`, `\n`, `\r`, `\t`, `\v`, octal `\NNN`
/// (1-3 digits, value capped at 255) and hex `\xHH` (1-2 digits). An unknown
/// escape yields the escaped character itself; a trailing lone backslash is
/// kept literally.
pub fn unescape(s: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        if s[i] == b'\\' {
            let (b, advance) = parse_escape(s, i);
            out.push(b);
            i += advance;
        } else {
            out.push(s[i]);
            i += 1;
        }
    }
    out
}

/// Returns the decoded byte and how many input bytes it used.
fn parse_escape(s: &[u8], i: usize) -> (u8, usize) {
    debug_assert_eq!(s[i], b'\\');
    let Some(&c) = s.get(i + 1) else {
        return (b'\\', 1);
    };
    match c {
        b'\\' => (b'\\', 2),
        b'a' => (0x07, 2),
        b'b' => (0x08, 2),
        b'f' => (0x0C, 2),
        b'n' => (b'\n', 2),
        b'r' => (b'\r', 2),
        b't' => (b'\t', 2),
        b'v' => (0x0B, 2),
        b'0'..=b'7' => {
            let mut val = 0u16;
            let mut used = 1;
            while used <= 3 {
                match s.get(i + used) {
                    Some(&d @ b'0'..=b'7') => {
                        let next = val * 8 + (d - b'0') as u16;
                        if next > 255 {
                            break;
                        }
                        val = next;
                        used += 1;
                    }
                    _ => break,
                }
            }
            (val as u8, used)
        }
        b'x' => {
            let digits = s[i + 2..]
                .iter()
                .take(2)
                .map_while(|&d| (d as char).to_digit(16))
                .collect::<Vec<_>>();
            if digits.is_empty() {
                return (b'x', 2);
            }
            let val = digits.iter().fold(0u32, |acc, &d| acc * 16 + d);
            (val as u8, 2 + digits.len())
        }
        other => (other, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::unescape;

    #[test]
    fn test_plain() {
        assert_eq!(unescape(b"abc"), b"abc");
        assert_eq!(unescape(b""), b"");
    }

    #[test]
    fn test_control_escapes() {
        assert_eq!(unescape(b"\\n"), b"\n");
        assert_eq!(unescape(b"\\t\\r"), b"\t\r");
        assert_eq!(unescape(b"\\\\"), b"\\");
        assert_eq!(unescape(b"\\a\\b\\f\\v"), [0x07, 0x08, 0x0C, 0x0B]);
    }

    #[test]
    fn test_octal() {
        assert_eq!(unescape(b"\\101"), b"A");
        assert_eq!(unescape(b"\\0"), [0u8]);
        assert_eq!(unescape(b"\\0101"), [0o10, b'1']);
        // \400 would overflow a byte; stop after two digits.
        assert_eq!(unescape(b"\\400"), [0o40, b'0']);
    }

    #[test]
    fn test_hex() {
        assert_eq!(unescape(b"\\x41"), b"A");
        assert_eq!(unescape(b"\\xff"), [0xFF]);
        assert_eq!(unescape(b"\\x4"), [0x04]);
        assert_eq!(unescape(b"\\x414"), b"A4");
        assert_eq!(unescape(b"\\xg"), b"xg");
    }

    #[test]
    fn test_unknown_and_trailing() {
        assert_eq!(unescape(b"\\q"), b"q");
        assert_eq!(unescape(b"ab\\"), b"ab\\");
    }
}
