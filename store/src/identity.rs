//! Object identities and their path forms.
//!
//! An identity is either an opaque 20-character token naming exactly one
//! object, or a `kind/primary-key` pair. Both normalize to a two-segment
//! path: `id/<token>` or `<kind>/<key>` with the kind lowercased.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A string naming an object: `kind/primary-key`, `id/token`, or a bare
/// identity token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectIdentity(String);

impl ObjectIdentity {
    /// Generate a fresh identity token: a type-4 UUID with hyphens removed,
    /// keeping characters 5..25. The 20-character lowercase hex form is a
    /// compatibility contract with persisted data.
    pub fn random() -> Self {
        let id = Uuid::new_v4().simple().to_string();
        ObjectIdentity(id[5..25].to_string())
    }

    /// Identity addressing one object of a kind by primary key.
    pub fn of_kind(kind: &str, key: &str) -> Self {
        ObjectIdentity(format!("{}/{}", kind.to_lowercase(), key))
    }

    /// Identity addressing a whole kind, as used by List: `kind/`.
    pub fn kind_scope(kind: &str) -> Self {
        ObjectIdentity(format!("{}/", kind.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The normalized two-segment path form.
    ///
    /// `World/c137` becomes `world/c137`; a bare token becomes `id/<token>`.
    pub fn path(&self) -> String {
        match self.0.find('/') {
            Some(pos) if pos > 0 => {
                let (kind, key) = self.0.split_at(pos);
                format!("{}{}", kind.to_lowercase(), key)
            }
            _ => format!("id/{}", self.0),
        }
    }

    /// The type segment of the path: a lowercase kind, or the literal `id`.
    pub fn kind(&self) -> String {
        let path = self.path();
        path.split('/').next().unwrap_or_default().to_string()
    }

    /// The key segment of the path. Empty for kind-scope identities.
    pub fn key(&self) -> String {
        let path = self.path();
        path.splitn(2, '/').nth(1).unwrap_or_default().to_string()
    }
}

impl std::fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectIdentity {
    fn from(value: &str) -> Self {
        ObjectIdentity(value.to_string())
    }
}

impl From<String> for ObjectIdentity {
    fn from(value: String) -> Self {
        ObjectIdentity(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_format() {
        let id = ObjectIdentity::random();
        assert_eq!(id.as_str().len(), 20);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn tokens_are_unique() {
        let a = ObjectIdentity::random();
        let b = ObjectIdentity::random();
        assert_ne!(a, b);
    }

    #[test]
    fn bare_token_path() {
        let id = ObjectIdentity::from("abcdef0123456789abcd");
        assert_eq!(id.path(), "id/abcdef0123456789abcd");
        assert_eq!(id.kind(), "id");
        assert_eq!(id.key(), "abcdef0123456789abcd");
    }

    #[test]
    fn kind_key_path_lowercases_kind_only() {
        let id = ObjectIdentity::from("World/C137");
        assert_eq!(id.path(), "world/C137");
        assert_eq!(id.kind(), "world");
        assert_eq!(id.key(), "C137");
    }

    #[test]
    fn kind_scope_has_empty_key() {
        let id = ObjectIdentity::kind_scope("World");
        assert_eq!(id.path(), "world/");
        assert_eq!(id.kind(), "world");
        assert_eq!(id.key(), "");
    }

    #[test]
    fn of_kind() {
        let id = ObjectIdentity::of_kind("SecondWorld", "def");
        assert_eq!(id.as_str(), "secondworld/def");
    }

    #[test]
    fn serde_transparent() {
        let id = ObjectIdentity::from("world/abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"world/abc\"");
        let parsed: ObjectIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
