//! The generic field layer between raw header lines and typed messages.
//!
//! A header line is `Name: value`, the value a comma-separated list of value
//! sets, each set whitespace-separated words followed by `;name=value`
//! parameters. Typed parsing and composing sit on top of this shape.

/// One `;name=value` (or bare `;name`) parameter of a value set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipParameter {
    pub name: String,
    pub value: Option<String>,
}

/// One comma-separated element of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueSet {
    pub words: Vec<String>,
    pub parameters: Vec<SipParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipField {
    pub name: String,
    pub value_sets: Vec<ValueSet>,
}

/// Field names are tokens: ASCII alphanumerics and `-`, nothing else.
#[must_use]
pub fn valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Splits a field value into value sets. Never fails; an empty value yields
/// one empty set, which typed parsing then rejects where it matters.
#[must_use]
pub fn parse_value_sets(value: &str) -> Vec<ValueSet> {
    value
        .split(',')
        .map(|element| {
            let mut parts = element.split(';');
            let words = parts
                .next()
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect();
            let parameters = parts
                .filter(|p| !p.trim().is_empty())
                .map(|p| match p.trim().split_once('=') {
                    Some((name, value)) => SipParameter {
                        name: name.to_string(),
                        value: Some(value.to_string()),
                    },
                    None => SipParameter {
                        name: p.trim().to_string(),
                        value: None,
                    },
                })
                .collect();
            ValueSet { words, parameters }
        })
        .collect()
}

/// Extracts user and host from a `sip:` URI, with or without angle brackets.
#[must_use]
pub fn parse_uri(token: &str) -> Option<(String, String)> {
    let inner = token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token);
    let rest = inner.strip_prefix("sip:")?;
    let (user, host) = rest.split_once('@')?;
    if user.is_empty() || host.is_empty() {
        return None;
    }
    Some((user.to_string(), host.to_string()))
}

/// Reads a name-addr value set: optional quoted or bare display-name words
/// followed by a bracketed URI. Returns (realname, username, host).
#[must_use]
pub fn parse_name_addr(words: &[String]) -> Option<(String, String, String)> {
    let uri_word = words.last()?;
    let (username, host) = parse_uri(uri_word)?;
    let realname = words[..words.len() - 1]
        .join(" ")
        .trim_matches('"')
        .to_string();
    Some((realname, username, host))
}

/// The inverse of [`parse_name_addr`]. An empty realname composes to a bare
/// bracketed URI.
#[must_use]
pub fn compose_name_addr(realname: &str, username: &str, host: &str) -> String {
    if realname.is_empty() {
        format!("<sip:{username}@{host}>")
    } else {
        format!("\"{realname}\" <sip:{username}@{host}>")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn words(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn field_names_are_tokens() {
        assert!(valid_field_name("Call-ID"));
        assert!(valid_field_name("Via"));
        assert!(!valid_field_name(""));
        assert!(!valid_field_name("Bad Name"));
        assert!(!valid_field_name("Call_ID"));
    }

    #[test]
    fn value_sets_split_on_commas_then_semicolons() {
        let sets = parse_value_sets("SIP/2.0/TCP host1;branch=z9, SIP/2.0/TCP host2");
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].words, words(&["SIP/2.0/TCP", "host1"]));
        assert_eq!(sets[0].parameters.len(), 1);
        assert_eq!(sets[0].parameters[0].name, "branch");
        assert_eq!(sets[0].parameters[0].value.as_deref(), Some("z9"));
        assert_eq!(sets[1].words, words(&["SIP/2.0/TCP", "host2"]));
    }

    #[test]
    fn bare_parameters_have_no_value() {
        let sets = parse_value_sets("<sip:a@b>;lr");
        assert_eq!(sets[0].parameters[0].name, "lr");
        assert_eq!(sets[0].parameters[0].value, None);
    }

    #[test]
    fn uri_parses_with_and_without_brackets() {
        assert_eq!(
            parse_uri("<sip:alice@example.com>").unwrap(),
            ("alice".to_string(), "example.com".to_string())
        );
        assert_eq!(
            parse_uri("sip:bob@10.0.0.2").unwrap(),
            ("bob".to_string(), "10.0.0.2".to_string())
        );
        assert!(parse_uri("mailto:a@b").is_none());
        assert!(parse_uri("sip:nohost@").is_none());
    }

    #[test]
    fn name_addr_round_trips() {
        let composed = compose_name_addr("Alice A", "alice", "example.com");
        let sets = parse_value_sets(&composed);
        let (realname, user, host) = parse_name_addr(&sets[0].words).unwrap();
        assert_eq!(realname, "Alice A");
        assert_eq!(user, "alice");
        assert_eq!(host, "example.com");

        assert_eq!(compose_name_addr("", "bob", "b.example"), "<sip:bob@b.example>");
    }
}
