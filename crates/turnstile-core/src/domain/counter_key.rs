use std::fmt;

/// Identity of one counting window in the counter store.
///
/// Composed as `<namespace>:<prefix length>:<prefix>:<client id>`. Because the
/// prefix is length-delimited, a `:` inside the prefix or the client id cannot
/// make two distinct (prefix, client) pairs collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey(String);

impl CounterKey {
    pub fn compose(namespace: &str, prefix: &str, client_id: &str) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            namespace,
            prefix.len(),
            prefix,
            client_id
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CounterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
