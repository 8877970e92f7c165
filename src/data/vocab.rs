// ============================================================
// Layer 4 — Vocabulary Index
// ============================================================
// Bidirectional token ↔ id mapping loaded once from a plain
// text file, one token per line. Line order defines the ids.
//
// The unknown token <unk> always exists: if the file does not
// list it, it is prepended at id 0. Every lookup miss maps to
// it, so `id_of` never fails.

use std::{collections::HashMap, fs, path::Path};

use crate::error::{Result, VqaError};

pub const UNK_TOKEN: &str = "<unk>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyIndex {
    id_to_token: Vec<String>,
    token_to_id: HashMap<String, usize>,
    unknown_id: usize,
}

impl VocabularyIndex {
    /// Load a newline-separated vocabulary file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| VqaError::io(path, e))?;

        let vocab = Self::from_tokens(text.lines().map(str::trim_end))
            .map_err(|e| match e {
                VqaError::Format(msg) => {
                    VqaError::Format(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?;

        tracing::debug!("Loaded vocabulary '{}' ({} tokens)", path.display(), vocab.size());
        Ok(vocab)
    }

    /// Build from an in-memory token list. A single trailing empty
    /// line is tolerated; any other blank entry is malformed.
    pub fn from_tokens<S: AsRef<str>>(tokens: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut words: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        if words.last().is_some_and(|w| w.is_empty()) {
            words.pop();
        }
        if words.is_empty() {
            return Err(VqaError::format("vocabulary is empty"));
        }

        if !words.iter().any(|w| w == UNK_TOKEN) {
            words.insert(0, UNK_TOKEN.to_string());
        }

        let mut token_to_id = HashMap::with_capacity(words.len());
        for (id, word) in words.iter().enumerate() {
            if word.is_empty() {
                return Err(VqaError::format(format!("blank vocabulary entry at id {id}")));
            }
            if token_to_id.insert(word.clone(), id).is_some() {
                return Err(VqaError::format(format!("duplicate vocabulary entry '{word}'")));
            }
        }

        let unknown_id = token_to_id[UNK_TOKEN];
        Ok(Self { id_to_token: words, token_to_id, unknown_id })
    }

    pub fn size(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn unknown_id(&self) -> usize {
        self.unknown_id
    }

    /// Exact-match lookup; misses map to `unknown_id`.
    pub fn id_of(&self, token: &str) -> usize {
        self.token_to_id.get(token).copied().unwrap_or(self.unknown_id)
    }

    pub fn token_of(&self, id: usize) -> Result<&str> {
        self.id_to_token
            .get(id)
            .map(String::as_str)
            .ok_or(VqaError::Index { index: id, len: self.size() })
    }

    pub fn tokens(&self) -> &[String] {
        &self.id_to_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unk_prepended_when_missing() {
        let vocab = VocabularyIndex::from_tokens(["cat", "dog"]).unwrap();
        assert_eq!(vocab.size(), 3);
        assert_eq!(vocab.unknown_id(), 0);
        assert_eq!(vocab.id_of("cat"), 1);
    }

    #[test]
    fn test_existing_unk_kept_in_place() {
        let vocab = VocabularyIndex::from_tokens(["cat", UNK_TOKEN, "dog"]).unwrap();
        assert_eq!(vocab.size(), 3);
        assert_eq!(vocab.unknown_id(), 1);
    }

    #[test]
    fn test_lookup_is_stable_and_oov_maps_to_unknown() {
        let vocab = VocabularyIndex::from_tokens(["yes", "no", "two"]).unwrap();
        for token in ["yes", "no", "two"] {
            assert_eq!(vocab.id_of(token), vocab.id_of(token));
            assert_eq!(vocab.token_of(vocab.id_of(token)).unwrap(), token);
        }
        assert_eq!(vocab.id_of("maybe"), vocab.unknown_id());
        assert_eq!(vocab.id_of("Yes"), vocab.unknown_id());
    }

    #[test]
    fn test_token_of_out_of_range() {
        let vocab = VocabularyIndex::from_tokens(["a"]).unwrap();
        assert!(matches!(vocab.token_of(2), Err(VqaError::Index { index: 2, len: 2 })));
    }

    #[test]
    fn test_malformed_vocabularies() {
        assert!(matches!(VocabularyIndex::from_tokens(Vec::<String>::new()), Err(VqaError::Format(_))));
        assert!(matches!(VocabularyIndex::from_tokens(["a", "", "b"]), Err(VqaError::Format(_))));
        assert!(matches!(VocabularyIndex::from_tokens(["a", "b", "a"]), Err(VqaError::Format(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "<unk>\nyes\nno\nred").unwrap();
        let vocab = VocabularyIndex::from_file(file.path()).unwrap();
        assert_eq!(vocab.size(), 4);
        assert_eq!(vocab.id_of("red"), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = VocabularyIndex::from_file("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, VqaError::Io { .. }));
    }
}
