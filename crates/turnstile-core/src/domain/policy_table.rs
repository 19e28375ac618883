//! Prefix-based policy lookup.

use std::collections::HashSet;

use crate::domain::RatePolicy;
use crate::error::DomainError;

/// The policy selected for a request path, together with the prefix that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyMatch<'a> {
    pub prefix: &'a str,
    pub policy: &'a RatePolicy,
}

/// Immutable mapping from path prefixes to rate policies.
///
/// Entries are kept ordered longest prefix first (ties broken lexicographically),
/// so when several prefixes match a path the most specific one wins. Built once
/// at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    entries: Vec<(String, RatePolicy)>,
}

impl PolicyTable {
    pub fn new<I, P>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (P, RatePolicy)>,
        P: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut collected = Vec::new();

        for (prefix, policy) in entries {
            let prefix = prefix.into();
            if !seen.insert(prefix.clone()) {
                return Err(DomainError::DuplicatePrefix(prefix));
            }
            collected.push((prefix, policy));
        }

        collected.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Ok(Self { entries: collected })
    }

    /// Resolve the policy governing `path`, if any prefix applies.
    pub fn resolve(&self, path: &str) -> Option<PolicyMatch<'_>> {
        self.entries
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(prefix, policy)| PolicyMatch { prefix, policy })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RatePolicy)> {
        self.entries.iter().map(|(p, policy)| (p.as_str(), policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(window: u64, count: u64) -> RatePolicy {
        RatePolicy::new(window, count).unwrap()
    }

    fn table() -> PolicyTable {
        PolicyTable::new([
            ("/login", policy(10, 5)),
            ("/v1", policy(1, 600)),
            ("/invite", policy(7200, 20)),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolves_registered_prefix() {
        let table = table();
        let matched = table.resolve("/login/foo").unwrap();
        assert_eq!(matched.prefix, "/login");
        assert_eq!(*matched.policy, policy(10, 5));
    }

    #[test]
    fn test_unregistered_path_has_no_policy() {
        assert!(table().resolve("/unregistered").is_none());
        assert!(table().resolve("").is_none());
    }

    #[test]
    fn test_prefix_match_is_raw_string_prefix() {
        // "/v1beta" starts with "/v1", so it shares that budget.
        let table = table();
        assert_eq!(table.resolve("/v1beta/models").unwrap().prefix, "/v1");
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = PolicyTable::new([
            ("/sub", policy(1, 1)),
            ("/subscription", policy(1, 2)),
            ("/subscribe", policy(1, 3)),
        ])
        .unwrap();

        for _ in 0..10 {
            assert_eq!(table.resolve("/subscription/list").unwrap().prefix, "/subscription");
            assert_eq!(table.resolve("/subscribe").unwrap().prefix, "/subscribe");
            assert_eq!(table.resolve("/subx").unwrap().prefix, "/sub");
        }
    }

    #[test]
    fn test_duplicate_prefix_rejected() {
        let err = PolicyTable::new([("/chat", policy(1, 5)), ("/chat", policy(1, 6))]).unwrap_err();
        assert_eq!(err, DomainError::DuplicatePrefix("/chat".to_string()));
    }

    #[test]
    fn test_iteration_order_is_longest_first() {
        let table = table();
        let prefixes: Vec<&str> = table.iter().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["/invite", "/login", "/v1"]);
        assert_eq!(table.len(), 3);
    }
}
