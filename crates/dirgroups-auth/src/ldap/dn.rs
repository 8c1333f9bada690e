//! Distinguished names
//!
//! Parses RFC 4514 string DNs into their RDNs. RDNs are kept most-specific
//! first, the order they appear in the string form.

use dirgroups_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Characters escaped with a backslash when an RDN value is rendered.
const VALUE_ESCAPEES: &str = ",=+<>#;\"\\";

/// One `type=value` pair of an RDN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    pub attr_type: String,
    /// Unescaped value
    pub value: String,
}

impl fmt::Display for AttributeTypeAndValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attr_type, escape_value(&self.value))
    }
}

/// Relative distinguished name, e.g. `cn=alice`
///
/// Multi-valued RDNs (`cn=alice+uid=alice`) keep their pairs in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
    avas: Vec<AttributeTypeAndValue>,
}

impl Rdn {
    pub fn new(attr_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            avas: vec![AttributeTypeAndValue {
                attr_type: attr_type.into(),
                value: value.into(),
            }],
        }
    }

    /// Attribute type of the first pair
    pub fn attr_type(&self) -> &str {
        &self.avas[0].attr_type
    }

    /// Unescaped value of the first pair
    pub fn value(&self) -> &str {
        &self.avas[0].value
    }

    pub fn avas(&self) -> &[AttributeTypeAndValue] {
        &self.avas
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ava) in self.avas.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}", ava)?;
        }
        Ok(())
    }
}

/// A resolved identity's location in the directory tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistinguishedName {
    rdns: Vec<Rdn>,
}

impl DistinguishedName {
    /// Parse a string DN as returned by the directory
    pub fn parse(dn: &str) -> Result<Self> {
        let rdns = split_unescaped(dn, dn, &[',', ';'])?
            .into_iter()
            .map(|component| parse_rdn(dn, component))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rdns })
    }

    /// RDNs, most-specific first
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// The entry's own RDN (`cn=alice` in `cn=alice,ou=users,dc=example,dc=com`)
    pub fn leaf(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }
}

impl FromStr for DistinguishedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", rdn)?;
        }
        Ok(())
    }
}

/// Split on separator characters that are neither backslash-escaped nor
/// inside a quoted value. An all-whitespace input yields no parts.
///
/// A `"` only opens a quoted value directly after the `=`, surrounding
/// whitespace aside. Anywhere else it is rejected.
fn split_unescaped<'a>(dn: &str, input: &'a str, separators: &[char]) -> Result<Vec<&'a str>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut quoted = false;
    let mut in_value = false;
    let mut value_start = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if quoted {
            match c {
                '\\' => escaped = true,
                '"' => quoted = false,
                _ => {}
            }
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                value_start = false;
            }
            '"' if value_start => {
                quoted = true;
                value_start = false;
            }
            '"' => return Err(Error::invalid_name(dn, "unexpected '\"' inside a value")),
            '=' if !in_value => {
                in_value = true;
                value_start = true;
            }
            c if separators.contains(&c) => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
                in_value = false;
                value_start = false;
            }
            // separators of an enclosing or nested level still end the value
            ',' | ';' | '+' => {
                in_value = false;
                value_start = false;
            }
            c if c.is_whitespace() => {}
            _ => value_start = false,
        }
    }

    if quoted {
        return Err(Error::invalid_name(dn, "unterminated quoted value"));
    }

    parts.push(&input[start..]);
    Ok(parts)
}

fn parse_rdn(dn: &str, component: &str) -> Result<Rdn> {
    let component = component.trim();
    if component.is_empty() {
        return Err(Error::invalid_name(dn, "empty RDN"));
    }

    let avas = split_unescaped(dn, component, &['+'])?
        .into_iter()
        .map(|ava| {
            let (attr_type, raw_value) = ava
                .split_once('=')
                .ok_or_else(|| Error::invalid_name(dn, format!("missing '=' in '{}'", ava)))?;
            let attr_type = attr_type.trim();
            if attr_type.is_empty() {
                return Err(Error::invalid_name(dn, format!("missing attribute type in '{}'", ava)));
            }
            Ok(AttributeTypeAndValue {
                attr_type: attr_type.to_string(),
                value: unescape_value(dn, raw_value)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Rdn { avas })
}

/// Decode an attribute value: quoting, `\c` and `\XX` hex escapes.
/// Unescaped leading and trailing spaces are not part of the value.
fn unescape_value(dn: &str, raw: &str) -> Result<String> {
    let raw = trim_unescaped(raw);

    // BER-encoded values are kept verbatim
    if raw.starts_with('#') {
        return Ok(raw.to_string());
    }

    let raw = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => inner,
        None => raw,
    };

    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let next = chars
            .next()
            .ok_or_else(|| Error::invalid_name(dn, "dangling escape"))?;
        match (next.to_digit(16), chars.peek().and_then(|c| c.to_digit(16))) {
            (Some(hi), Some(lo)) => {
                chars.next();
                bytes.push((hi * 16 + lo) as u8);
            }
            _ => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8(bytes).map_err(|_| Error::invalid_name(dn, "escaped value is not UTF-8"))
}

fn trim_unescaped(raw: &str) -> &str {
    let raw = raw.trim_start();
    let mut end = raw.len();
    while end > 0 && raw.as_bytes()[end - 1] == b' ' {
        let backslashes = raw.as_bytes()[..end - 1]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        if backslashes % 2 == 1 {
            break;
        }
        end -= 1;
    }
    &raw[..end]
}

/// Render a value in RFC 2253 string form
fn escape_value(value: &str) -> String {
    let lead = value.len() - value.trim_start().len();
    let trail = value.trim_end().len();

    let mut escaped = String::with_capacity(value.len() * 2);
    for (i, c) in value.char_indices() {
        if i < lead || i >= trail || VALUE_ESCAPEES.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_dn() {
        let dn = DistinguishedName::parse("cn=alice,ou=users,dc=example,dc=com").unwrap();

        assert_eq!(dn.len(), 4);
        assert_eq!(dn.leaf().unwrap().attr_type(), "cn");
        assert_eq!(dn.leaf().unwrap().value(), "alice");
        assert_eq!(dn.rdns()[3].to_string(), "dc=com");
        assert_eq!(dn.to_string(), "cn=alice,ou=users,dc=example,dc=com");
    }

    #[test]
    fn test_parse_trims_whitespace_between_rdns() {
        let dn = DistinguishedName::parse("uid=bob , ou=people ;dc=example").unwrap();
        let values: Vec<_> = dn.rdns().iter().map(|r| r.value()).collect();
        assert_eq!(values, vec!["bob", "people", "example"]);
    }

    #[test]
    fn test_parse_escaped_values() {
        let dn = DistinguishedName::parse(r"cn=Smith\, John,ou=users,dc=example,dc=com").unwrap();
        assert_eq!(dn.len(), 4);
        assert_eq!(dn.leaf().unwrap().value(), "Smith, John");
        assert_eq!(dn.leaf().unwrap().to_string(), r"cn=Smith\, John");

        let dn = DistinguishedName::parse(r"cn=Smith\2C John,dc=com").unwrap();
        assert_eq!(dn.leaf().unwrap().value(), "Smith, John");

        let dn = DistinguishedName::parse(r"cn=J\C3\BCrgen,dc=com").unwrap();
        assert_eq!(dn.leaf().unwrap().value(), "Jürgen");
    }

    #[test]
    fn test_parse_quoted_value() {
        let dn = DistinguishedName::parse(r#"cn="Doe, Jane",dc=com"#).unwrap();
        assert_eq!(dn.len(), 2);
        assert_eq!(dn.leaf().unwrap().value(), "Doe, Jane");

        let dn = DistinguishedName::parse(r#"cn= "a+b" +uid=x,dc=com"#).unwrap();
        assert_eq!(dn.leaf().unwrap().avas().len(), 2);
        assert_eq!(dn.leaf().unwrap().value(), "a+b");
    }

    #[test]
    fn test_parse_rejects_stray_quotes() {
        let err = DistinguishedName::parse(r#"cn=a"b,dc=com"#).unwrap_err();
        assert_eq!(err.code(), "InvalidName");

        assert!(DistinguishedName::parse(r#"cn="unterminated,dc=com"#).is_err());

        let dn = DistinguishedName::parse(r#"cn=a"b,dc=com"#).unwrap();
        assert_eq!(dn.len(), 2);
        assert_eq!(dn.leaf().unwrap().value(), "a\"b");
    }

    #[test]
    fn test_parse_multi_valued_rdn() {
        let dn = DistinguishedName::parse("cn=alice+uid=a1,dc=com").unwrap();
        let leaf = dn.leaf().unwrap();
        assert_eq!(leaf.avas().len(), 2);
        assert_eq!(leaf.value(), "alice");
        assert_eq!(leaf.to_string(), "cn=alice+uid=a1");
    }

    #[test]
    fn test_parse_empty_dn() {
        let dn = DistinguishedName::parse("").unwrap();
        assert!(dn.is_empty());
        assert!(dn.leaf().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(DistinguishedName::parse("cn=alice,,dc=com").is_err());
        assert!(DistinguishedName::parse("alice,dc=com").is_err());
        assert!(DistinguishedName::parse("=alice").is_err());
        assert!(DistinguishedName::parse(r"cn=alice\").is_err());

        let err = DistinguishedName::parse("alice").unwrap_err();
        assert_eq!(err.code(), "InvalidName");
    }

    #[test]
    fn test_render_escapes_special_characters() {
        let rdn = Rdn::new("cn", " #admins; (ops) ");
        assert_eq!(rdn.to_string(), r"cn=\ \#admins\; (ops)\ ");
    }
}
