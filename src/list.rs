//! List and string helpers shared by the operators and the export helpers.
//!
//! Build-system lists are `;`-separated strings. Splitting honours `[...]`
//! nesting (a `;` inside brackets does not split) and `\;` escapes.

use std::cmp::Ordering;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TARGET_NAME: Regex =
        Regex::new(r"^[A-Za-z0-9_.:+-]+$").expect("target name pattern");
}

/// Splits a list string into its non-empty elements.
pub fn expand_list(input: &str) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }
    if !input.contains(';') {
        return vec![input.to_string()];
    }

    let bytes = input.as_bytes();
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut last = 0;
    let mut square_nesting = 0i32;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b';') => {
                current.push_str(&input[last..i]);
                // keep the ';', drop the backslash
                last = i + 1;
                i += 1;
            }
            b'[' => square_nesting += 1,
            b']' => square_nesting -= 1,
            b';' if square_nesting == 0 => {
                current.push_str(&input[last..i]);
                last = i + 1;
                if !current.is_empty() {
                    elements.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
        i += 1;
    }

    current.push_str(&input[last..]);
    if !current.is_empty() {
        elements.push(current);
    }
    elements
}

/// Removes empty elements from a `;`-list, keeping the separators between
/// the remaining ones.
pub fn strip_empty_list_elements(input: &str) -> String {
    if !input.contains(';') {
        return input.to_string();
    }
    input
        .split(';')
        .filter(|element| !element.is_empty())
        .collect::<Vec<_>>()
        .join(";")
}

pub fn is_valid_target_name(name: &str) -> bool {
    TARGET_NAME.is_match(name)
}

/// Truthy constants: `ON`, `1`, `YES`, `TRUE`, `Y` (case-insensitive).
pub fn is_on(value: &str) -> bool {
    if value.len() > 4 {
        return false;
    }
    matches!(
        value.to_ascii_uppercase().as_str(),
        "ON" | "1" | "YES" | "TRUE" | "Y"
    )
}

/// Falsy constants. Everything that is not one of these is true for `$<BOOL>`.
pub fn is_off(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let upper = value.to_ascii_uppercase();
    matches!(
        upper.as_str(),
        "0" | "OFF" | "NO" | "FALSE" | "N" | "IGNORE" | "NOTFOUND"
    ) || upper.ends_with("-NOTFOUND")
}

/// Maps a string onto a valid C identifier: non-alphanumeric bytes become
/// `_`, and a leading digit gets a `_` prefix.
pub fn make_c_identifier(input: &str) -> String {
    let mut identifier = String::with_capacity(input.len() + 1);
    if input.as_bytes().first().is_some_and(u8::is_ascii_digit) {
        identifier.push('_');
    }
    identifier.extend(input.bytes().map(|b| {
        if b.is_ascii_alphanumeric() || b == b'_' {
            b as char
        } else {
            '_'
        }
    }));
    identifier
}

/// Component-wise comparison of dotted version strings. Missing or
/// non-numeric components compare as zero.
pub fn version_compare(lhs: &str, rhs: &str) -> Ordering {
    let (lhs, rhs) = (lhs.as_bytes(), rhs.as_bytes());
    let (mut l, mut r) = (0, 0);
    let at_digit = |s: &[u8], i: usize| s.get(i).is_some_and(u8::is_ascii_digit);

    while at_digit(lhs, l) || at_digit(rhs, r) {
        let left = read_component(lhs, &mut l);
        let right = read_component(rhs, &mut r);
        match left.cmp(&right) {
            Ordering::Equal => {}
            other => return other,
        }
        if rhs.get(r) == Some(&b'.') {
            r += 1;
        }
        if lhs.get(l) == Some(&b'.') {
            l += 1;
        }
    }
    Ordering::Equal
}

fn read_component(s: &[u8], cursor: &mut usize) -> u64 {
    let mut value: u64 = 0;
    while let Some(digit) = s.get(*cursor).filter(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(u64::from(digit - b'0'));
        *cursor += 1;
    }
    value
}

/// Parses an integer the way `$<EQUAL>` expects: optional sign, `0x` hex,
/// leading-zero octal, and `0b`/`-0b`/`+0b` binary prefixes. The whole
/// string must be consumed.
pub fn parse_integer(input: &str) -> Option<i64> {
    let (digits, negate) = if let Some(rest) = input
        .strip_prefix("0b")
        .or_else(|| input.strip_prefix("0B"))
    {
        return parse_c_long(rest, 2);
    } else if let Some(rest) = input
        .strip_prefix("-0b")
        .or_else(|| input.strip_prefix("-0B"))
    {
        (rest, true)
    } else if let Some(rest) = input
        .strip_prefix("+0b")
        .or_else(|| input.strip_prefix("+0B"))
    {
        (rest, false)
    } else {
        return parse_c_long(input, 0);
    };
    parse_c_long(digits, 2).and_then(|value| if negate { value.checked_neg() } else { Some(value) })
}

/// C `strtol` with base auto-detection; the whole string must be a number.
pub fn parse_long(input: &str) -> Option<i64> {
    parse_c_long(input, 0)
}

/// `strtol` restricted to base 0 (auto-detect) and base 2, rejecting
/// trailing garbage and overflow.
fn parse_c_long(input: &str, base: u32) -> Option<i64> {
    let mut rest = input.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let negative = match rest.as_bytes().first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let radix = if base != 0 {
        base
    } else if (rest.starts_with("0x") || rest.starts_with("0X"))
        && rest[2..].starts_with(|c: char| c.is_ascii_hexdigit())
    {
        rest = &rest[2..];
        16
    } else if rest.starts_with('0') {
        8
    } else {
        10
    };

    if rest.is_empty() || !rest.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = rest.chars().try_fold(0u64, |acc, c| {
        acc.checked_mul(u64::from(radix))?
            .checked_add(u64::from(c.to_digit(radix)?))
    })?;

    if negative {
        if magnitude == i64::MAX as u64 + 1 {
            Some(i64::MIN)
        } else {
            i64::try_from(magnitude).ok().map(|v| -v)
        }
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Last path component.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Everything before the last `/`, or empty for a bare name.
pub fn directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}

pub fn is_full_path(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || path.as_bytes().get(1) == Some(&b':')
            && path.as_bytes().first().is_some_and(u8::is_ascii_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_list_basic() {
        assert_eq!(expand_list("a;b;c"), vec!["a", "b", "c"]);
        assert_eq!(expand_list(""), Vec::<String>::new());
        assert_eq!(expand_list("single"), vec!["single"]);
        assert_eq!(expand_list(";a;;b;"), vec!["a", "b"]);
    }

    #[test]
    fn test_expand_list_brackets_and_escapes() {
        assert_eq!(expand_list("a[x;y];b"), vec!["a[x;y]", "b"]);
        assert_eq!(expand_list(r"a\;b;c"), vec!["a;b", "c"]);
        assert_eq!(expand_list(r"a\b;c"), vec![r"a\b", "c"]);
    }

    #[test]
    fn test_strip_empty_list_elements() {
        assert_eq!(strip_empty_list_elements(";a;;b;"), "a;b");
        assert_eq!(strip_empty_list_elements(";;"), "");
        assert_eq!(strip_empty_list_elements("plain"), "plain");
    }

    #[test]
    fn test_truthiness() {
        for off in ["", "0", "off", "No", "FALSE", "n", "Ignore", "NOTFOUND", "Foo-NOTFOUND"] {
            assert!(is_off(off), "{off:?} should be off");
        }
        for on in ["1", "ON", "yes", "anything", "2"] {
            assert!(!is_off(on), "{on:?} should not be off");
        }
        assert!(is_on("True"));
        assert!(!is_on("truthy"));
    }

    #[test]
    fn test_make_c_identifier() {
        assert_eq!(make_c_identifier("foo-bar.h"), "foo_bar_h");
        assert_eq!(make_c_identifier("1st"), "_1st");
        assert_eq!(make_c_identifier(""), "");
    }

    #[test]
    fn test_version_compare() {
        assert_eq!(version_compare("1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(version_compare("1.10", "1.9"), Ordering::Greater);
        assert_eq!(version_compare("1.2", "1.2.1"), Ordering::Less);
        assert_eq!(version_compare("1.2.0", "1.2"), Ordering::Equal);
        assert_eq!(version_compare("", ""), Ordering::Equal);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("010"), Some(8));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("-0b11"), Some(-3));
        assert_eq!(parse_integer("+0B11"), Some(3));
        assert_eq!(parse_integer("12abc"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("0x"), None);
        assert_eq!(parse_integer("09"), None);
        assert_eq!(parse_integer("99999999999999999999"), None);
    }

    #[test]
    fn test_paths() {
        assert_eq!(file_name("/a/b/libfoo.so"), "libfoo.so");
        assert_eq!(directory("/a/b/libfoo.so"), "/a/b");
        assert_eq!(directory("libfoo.so"), "");
        assert!(is_full_path("/usr"));
        assert!(is_full_path("C:/x"));
        assert!(!is_full_path("include"));
    }

    #[test]
    fn test_target_names() {
        assert!(is_valid_target_name("foo::bar-1.2+x"));
        assert!(!is_valid_target_name("foo bar"));
        assert!(!is_valid_target_name(""));
    }
}
