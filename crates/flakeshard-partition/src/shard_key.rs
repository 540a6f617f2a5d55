use std::fmt::Display;

/// The storage key of one daily shard, e.g. `type_stock:7:20240601`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardKey(String);

impl ShardKey {
    pub(crate) fn new(key: String) -> Self {
        Self(key)
    }

    /// Returns the shard key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShardKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ShardKey> for String {
    fn from(key: ShardKey) -> Self {
        key.0
    }
}

impl PartialEq<str> for ShardKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ShardKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
