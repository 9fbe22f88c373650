//! Content-addressed object model
//!
//! Three object kinds, mirroring a bare git repository:
//!
//! - blob: raw bytes (the serialized content of one revision)
//! - tree: named blob references, one line per entry, sorted by name
//! - commit: a tree id, zero to two parent ids, an author line, and a
//!   free-form message
//!
//! Every object is stored as `"<kind> <len>\0" ++ body` and addressed by
//! the SHA-256 of those bytes, rendered as 64 lowercase hex characters.
//! Identical inputs therefore always produce identical ids.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::{StoreError, StoreResult};

/// Hex-encoded SHA-256 identifier of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Computes the id for an object of `kind` with the given body.
    pub fn compute(kind: ObjectKind, body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(header(kind, body.len()));
        hasher.update(body);
        ObjectId(format!("{:x}", hasher.finalize()))
    }

    /// Validates and wraps a hex digest string.
    pub fn from_hex(hex: &str) -> StoreResult<Self> {
        if hex.len() != Self::HEX_LEN
            || !hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(StoreError::InvalidObject(format!(
                "'{}' is not a {}-char lowercase hex digest",
                hex,
                Self::HEX_LEN
            )));
        }
        Ok(ObjectId(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(ObjectKind::Blob),
            "tree" => Some(ObjectKind::Tree),
            "commit" => Some(ObjectKind::Commit),
            _ => None,
        }
    }
}

fn header(kind: ObjectKind, len: usize) -> Vec<u8> {
    format!("{} {}\0", kind.as_str(), len).into_bytes()
}

/// Frames a body with its kind header, ready for hashing or storage.
pub(crate) fn encode_object(kind: ObjectKind, body: &[u8]) -> Vec<u8> {
    let mut bytes = header(kind, body.len());
    bytes.extend_from_slice(body);
    bytes
}

/// Splits stored bytes into kind and body, verifying the framing.
pub(crate) fn decode_object(bytes: &[u8]) -> StoreResult<(ObjectKind, &[u8])> {
    let nul = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| StoreError::InvalidObject("missing header terminator".into()))?;
    let head = std::str::from_utf8(&bytes[..nul])
        .map_err(|_| StoreError::InvalidObject("header is not UTF-8".into()))?;
    let (kind_str, len_str) = head
        .split_once(' ')
        .ok_or_else(|| StoreError::InvalidObject(format!("malformed header '{}'", head)))?;
    let kind = ObjectKind::parse(kind_str)
        .ok_or_else(|| StoreError::InvalidObject(format!("unknown object kind '{}'", kind_str)))?;
    let len: usize = len_str
        .parse()
        .map_err(|_| StoreError::InvalidObject(format!("bad length '{}'", len_str)))?;
    let body = &bytes[nul + 1..];
    if body.len() != len {
        return Err(StoreError::InvalidObject(format!(
            "length mismatch: header says {}, body is {}",
            len,
            body.len()
        )));
    }
    Ok((kind, body))
}

/// Who made a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Author {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// One named blob reference inside a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub blob: ObjectId,
}

/// A tree object: named blob references sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Builds a tree, sorting entries by name for a deterministic encoding.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Tree { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Looks up a blob id by entry name.
    pub fn blob(&self, name: &str) -> Option<&ObjectId> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.blob)
    }

    pub(crate) fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut body = String::new();
        for entry in &self.entries {
            if entry.name.contains('\n') || entry.name.contains(' ') {
                return Err(StoreError::InvalidObject(format!(
                    "tree entry name '{}' contains whitespace",
                    entry.name
                )));
            }
            body.push_str(entry.blob.as_str());
            body.push(' ');
            body.push_str(&entry.name);
            body.push('\n');
        }
        Ok(body.into_bytes())
    }

    pub(crate) fn decode(body: &[u8]) -> StoreResult<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|_| StoreError::InvalidObject("tree body is not UTF-8".into()))?;
        let mut entries = Vec::new();
        for line in text.lines() {
            let (hex, name) = line
                .split_once(' ')
                .ok_or_else(|| StoreError::InvalidObject(format!("malformed tree line '{}'", line)))?;
            entries.push(TreeEntry {
                name: name.to_string(),
                blob: ObjectId::from_hex(hex)?,
            });
        }
        Ok(Tree { entries })
    }
}

/// A commit object: the immutable record behind one revision.
///
/// Parent count encodes the revision kind: 0 for the root, 1 for a save
/// (parent[0] is the previous tip), 2 for a promotion (parent[0] is the
/// previous tip on the destination state, parent[1] is the origin on the
/// source state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl Commit {
    pub(crate) fn encode(&self) -> StoreResult<Vec<u8>> {
        if self.parents.len() > 2 {
            return Err(StoreError::InvalidObject(format!(
                "commit has {} parents, at most 2 allowed",
                self.parents.len()
            )));
        }
        if self.author.name.contains('<') || self.author.name.contains('\n') {
            return Err(StoreError::InvalidObject(format!(
                "author name '{}' contains reserved characters",
                self.author.name
            )));
        }
        if self.author.email.contains('>') || self.author.email.chars().any(char::is_whitespace) {
            return Err(StoreError::InvalidObject(format!(
                "author email '{}' contains reserved characters",
                self.author.email
            )));
        }

        let mut body = String::new();
        body.push_str("tree ");
        body.push_str(self.tree.as_str());
        body.push('\n');
        for parent in &self.parents {
            body.push_str("parent ");
            body.push_str(parent.as_str());
            body.push('\n');
        }
        body.push_str("author ");
        body.push_str(&self.author.name);
        body.push_str(" <");
        body.push_str(&self.author.email);
        body.push_str("> ");
        body.push_str(&self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true));
        body.push('\n');
        body.push('\n');
        body.push_str(&self.message);
        Ok(body.into_bytes())
    }

    pub(crate) fn decode(body: &[u8]) -> StoreResult<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|_| StoreError::InvalidObject("commit body is not UTF-8".into()))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| StoreError::InvalidObject("commit has no header/message split".into()))?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut timestamp = None;

        for line in headers.lines() {
            if let Some(hex) = line.strip_prefix("tree ") {
                tree = Some(ObjectId::from_hex(hex)?);
            } else if let Some(hex) = line.strip_prefix("parent ") {
                parents.push(ObjectId::from_hex(hex)?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                let open = rest
                    .find('<')
                    .ok_or_else(|| StoreError::InvalidObject("author line missing '<'".into()))?;
                let close = rest
                    .find('>')
                    .ok_or_else(|| StoreError::InvalidObject("author line missing '>'".into()))?;
                if close < open {
                    return Err(StoreError::InvalidObject("malformed author line".into()));
                }
                let name = rest[..open].trim_end().to_string();
                let email = rest[open + 1..close].to_string();
                let when = rest[close + 1..].trim();
                let parsed = DateTime::parse_from_rfc3339(when).map_err(|e| {
                    StoreError::InvalidObject(format!("bad author timestamp '{}': {}", when, e))
                })?;
                author = Some(Author { name, email });
                timestamp = Some(parsed.with_timezone(&Utc));
            } else {
                return Err(StoreError::InvalidObject(format!(
                    "unknown commit header '{}'",
                    line
                )));
            }
        }

        if parents.len() > 2 {
            return Err(StoreError::InvalidObject(format!(
                "commit has {} parents, at most 2 allowed",
                parents.len()
            )));
        }

        Ok(Commit {
            tree: tree.ok_or_else(|| StoreError::InvalidObject("commit missing tree".into()))?,
            parents,
            author: author
                .ok_or_else(|| StoreError::InvalidObject("commit missing author".into()))?,
            timestamp: timestamp
                .ok_or_else(|| StoreError::InvalidObject("commit missing timestamp".into()))?,
            message: message.to_string(),
        })
    }
}

/// A decoded object of any kind.
#[derive(Debug, Clone)]
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Commit),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_author() -> Author {
        Author::new("A", "a@example.com")
    }

    fn sample_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 4, 12, 30, 0).unwrap()
    }

    fn some_id(fill: char) -> ObjectId {
        ObjectId::from_hex(&fill.to_string().repeat(ObjectId::HEX_LEN)).unwrap()
    }

    #[test]
    fn test_blob_id_deterministic() {
        let a = ObjectId::compute(ObjectKind::Blob, b"hello");
        let b = ObjectId::compute(ObjectKind::Blob, b"hello");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), ObjectId::HEX_LEN);
    }

    #[test]
    fn test_kind_is_part_of_identity() {
        let blob = ObjectId::compute(ObjectKind::Blob, b"x");
        let tree = ObjectId::compute(ObjectKind::Tree, b"x");
        assert_ne!(blob, tree);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(ObjectId::from_hex("abc").is_err());
        assert!(ObjectId::from_hex(&"G".repeat(64)).is_err());
        assert!(ObjectId::from_hex(&"A".repeat(64)).is_err()); // uppercase
        assert!(ObjectId::from_hex(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_object_framing_roundtrip() {
        let framed = encode_object(ObjectKind::Blob, b"payload");
        let (kind, body) = decode_object(&framed).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(body, b"payload");
    }

    #[test]
    fn test_object_framing_rejects_length_mismatch() {
        let mut framed = encode_object(ObjectKind::Blob, b"payload");
        framed.push(b'!');
        assert!(decode_object(&framed).is_err());
    }

    #[test]
    fn test_tree_roundtrip_sorted() {
        let tree = Tree::new(vec![
            TreeEntry { name: "zeta".into(), blob: some_id('b') },
            TreeEntry { name: "content".into(), blob: some_id('a') },
        ]);
        assert_eq!(tree.entries()[0].name, "content");

        let decoded = Tree::decode(&tree.encode().unwrap()).unwrap();
        assert_eq!(decoded, tree);
        assert_eq!(decoded.blob("zeta"), Some(&some_id('b')));
        assert_eq!(decoded.blob("missing"), None);
    }

    #[test]
    fn test_commit_roundtrip_no_parents() {
        let commit = Commit {
            tree: some_id('a'),
            parents: vec![],
            author: sample_author(),
            timestamp: sample_timestamp(),
            message: "First Commit".into(),
        };
        let decoded = Commit::decode(&commit.encode().unwrap()).unwrap();
        assert_eq!(decoded, commit);
    }

    #[test]
    fn test_commit_roundtrip_two_parents_multiline_message() {
        let commit = Commit {
            tree: some_id('a'),
            parents: vec![some_id('b'), some_id('c')],
            author: Author::new("Ann Author", "ann@example.com"),
            timestamp: sample_timestamp(),
            message: "publish\n\nsecond paragraph".into(),
        };
        let decoded = Commit::decode(&commit.encode().unwrap()).unwrap();
        assert_eq!(decoded, commit);
    }

    #[test]
    fn test_commit_id_deterministic_and_sensitive() {
        let commit = Commit {
            tree: some_id('a'),
            parents: vec![some_id('b')],
            author: sample_author(),
            timestamp: sample_timestamp(),
            message: "m".into(),
        };
        let id1 = ObjectId::compute(ObjectKind::Commit, &commit.encode().unwrap());
        let id2 = ObjectId::compute(ObjectKind::Commit, &commit.encode().unwrap());
        assert_eq!(id1, id2);

        let mut changed = commit.clone();
        changed.message = "m2".into();
        let id3 = ObjectId::compute(ObjectKind::Commit, &changed.encode().unwrap());
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_commit_rejects_three_parents() {
        let commit = Commit {
            tree: some_id('a'),
            parents: vec![some_id('b'), some_id('c'), some_id('d')],
            author: sample_author(),
            timestamp: sample_timestamp(),
            message: "m".into(),
        };
        assert!(commit.encode().is_err());
    }

    #[test]
    fn test_commit_rejects_reserved_author_characters() {
        let commit = Commit {
            tree: some_id('a'),
            parents: vec![],
            author: Author::new("A <sneaky>", "a@example.com"),
            timestamp: sample_timestamp(),
            message: "m".into(),
        };
        assert!(commit.encode().is_err());

        let commit = Commit {
            tree: some_id('a'),
            parents: vec![],
            author: Author::new("A", "a b@example.com"),
            timestamp: sample_timestamp(),
            message: "m".into(),
        };
        assert!(commit.encode().is_err());
    }
}
