//! Parsing of cookie strings copied from a browser's request headers.

use tracing::trace;

/// Name/value cookie pairs in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies {
    pairs: Vec<(String, String)>,
}

impl Cookies {
    /// Parses a `k1=v1; k2="v2"` string.
    ///
    /// Pairs without a name or without `=` are dropped. Surrounding double
    /// quotes are removed from values.
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split(';')
            .filter_map(|part| {
                let (name, value) = part.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    trace!("Dropping cookie pair without a name: {:?}", part);
                    return None;
                }

                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);

                Some((name.to_string(), value.to_string()))
            })
            .collect();

        Self { pairs }
    }

    /// Returns number of cookies.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no cookies were parsed.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over `(name, value)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
