use std::collections::BTreeMap;

/// Default label used when an account id has no configured mapping.
pub const UNKNOWN_ACCOUNT: &str = "UNKNOWN-ACCOUNT";

/// Translates account identifiers into human-readable labels.
///
/// The mapping is fixed at construction time, usually from
/// [`Config::resolver`](crate::config::Config::resolver).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountResolver {
    mappings: BTreeMap<String, String>,
}

impl AccountResolver {
    pub fn new(mappings: BTreeMap<String, String>) -> Self {
        Self { mappings }
    }

    /// Returns the label mapped to `account_id`, or `default` when unmapped.
    pub fn resolve<'a>(&'a self, account_id: &str, default: &'a str) -> &'a str {
        self.mappings
            .get(account_id)
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// Returns `"{label} ({account_id})"` when mapped, otherwise the bare id.
    pub fn resolve_formatted(&self, account_id: &str) -> String {
        match self.mappings.get(account_id) {
            Some(label) => format!("{label} ({account_id})"),
            None => account_id.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AccountResolver {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            mappings: iter
                .into_iter()
                .map(|(id, label)| (id.into(), label.into()))
                .collect(),
        }
    }
}
