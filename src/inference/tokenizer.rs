//! Word-index tokenizer compatible with the Keras `Tokenizer` that was fitted
//! alongside the model.
//!
//! The artifact is the document written by `Tokenizer.to_json()`. Splitting,
//! filtering and out-of-vocabulary handling reproduce `texts_to_sequences`
//! exactly; any divergence here changes scores without raising an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Turns free text into vocabulary ids.
pub trait TextEncoder: Send + Sync {
    /// Never fails: text with no known tokens encodes to an empty sequence.
    fn encode(&self, text: &str) -> Vec<i64>;
}

/// Options fixed when the tokenizer was fitted.
#[derive(Debug, Clone)]
pub struct TokenizerOptions {
    pub num_words: Option<usize>,
    pub filters: String,
    pub lower: bool,
    pub split: String,
    pub char_level: bool,
    pub oov_token: Option<String>,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            num_words: None,
            filters: DEFAULT_FILTERS.to_string(),
            lower: true,
            split: " ".to_string(),
            char_level: false,
            oov_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenizerDocument {
    #[serde(default)]
    class_name: Option<String>,
    config: RawTokenizerConfig,
}

#[derive(Debug, Deserialize)]
struct RawTokenizerConfig {
    #[serde(default)]
    num_words: Option<usize>,
    #[serde(default)]
    filters: Option<String>,
    #[serde(default = "default_lower")]
    lower: bool,
    #[serde(default)]
    split: Option<String>,
    #[serde(default)]
    char_level: bool,
    #[serde(default)]
    oov_token: Option<String>,
    // `to_json()` stores this as a JSON-encoded string.
    word_index: serde_json::Value,
}

fn default_lower() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct KerasTokenizer {
    options: TokenizerOptions,
    filters: HashSet<char>,
    word_index: HashMap<String, i64>,
    oov_index: Option<i64>,
}

impl KerasTokenizer {
    pub fn new(options: TokenizerOptions, word_index: HashMap<String, i64>) -> Result<Self> {
        if options.split.is_empty() && !options.char_level {
            return Err(Error::artifact("tokenizer split string must not be empty"));
        }

        let oov_index = options
            .oov_token
            .as_ref()
            .and_then(|token| word_index.get(token).copied());
        let filters = options.filters.chars().collect();

        Ok(Self {
            options,
            filters,
            word_index,
            oov_index,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::artifact(format!(
                "Tokenizer file not found: {}",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path)?;
        let tokenizer = Self::from_json(&raw).map_err(|e| {
            Error::artifact(format!("Failed to load tokenizer {}: {}", path.display(), e))
        })?;

        debug!(
            "Loaded tokenizer from {} ({} words)",
            path.display(),
            tokenizer.vocabulary_size()
        );
        Ok(tokenizer)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let document: TokenizerDocument = serde_json::from_str(raw)?;
        if let Some(class_name) = document.class_name.as_deref() {
            if class_name != "Tokenizer" {
                return Err(Error::artifact(format!(
                    "expected a Tokenizer document, found {}",
                    class_name
                )));
            }
        }

        let config = document.config;
        let word_index: HashMap<String, i64> = match config.word_index {
            serde_json::Value::String(encoded) => serde_json::from_str(&encoded)?,
            value @ serde_json::Value::Object(_) => serde_json::from_value(value)?,
            other => {
                return Err(Error::artifact(format!(
                    "word_index must be an object or encoded object, found {}",
                    other
                )));
            }
        };

        let options = TokenizerOptions {
            num_words: config.num_words,
            filters: config.filters.unwrap_or_else(|| DEFAULT_FILTERS.to_string()),
            lower: config.lower,
            split: config.split.unwrap_or_else(|| " ".to_string()),
            char_level: config.char_level,
            oov_token: config.oov_token,
        };

        Self::new(options, word_index)
    }

    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_index.len()
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        let text = if self.options.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        if self.options.char_level {
            return text.chars().map(String::from).collect();
        }

        let mut translated = String::with_capacity(text.len());
        for c in text.chars() {
            if self.filters.contains(&c) {
                translated.push_str(&self.options.split);
            } else {
                translated.push(c);
            }
        }

        translated
            .split(self.options.split.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn lookup(&self, token: &str) -> Option<i64> {
        // A zero cap means "no cap".
        let cap = self.options.num_words.filter(|&n| n > 0);

        match self.word_index.get(token) {
            Some(&index) => match cap {
                Some(cap) if index >= cap as i64 => self.oov_index,
                _ => Some(index),
            },
            None => self.oov_index,
        }
    }
}

impl TextEncoder for KerasTokenizer {
    fn encode(&self, text: &str) -> Vec<i64> {
        self.tokens(text)
            .iter()
            .filter_map(|token| self.lookup(token))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vocabulary(words: &[&str]) -> HashMap<String, i64> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_string(), i as i64 + 1))
            .collect()
    }

    #[test]
    fn test_filters_are_replaced_by_split() {
        let tokenizer =
            KerasTokenizer::new(TokenizerOptions::default(), vocabulary(&["or", "1", "select"]))
                .unwrap();
        // The single quote is not a default filter character.
        assert_eq!(tokenizer.tokens("' OR 1=1 --"), vec!["'", "or", "1", "1"]);
        assert_eq!(tokenizer.encode("' OR 1=1 --"), vec![1, 2, 2]);
    }

    #[test]
    fn test_unknown_words_dropped_without_oov_token() {
        let tokenizer =
            KerasTokenizer::new(TokenizerOptions::default(), vocabulary(&["select"])).unwrap();
        assert_eq!(tokenizer.encode("select name from users"), vec![1]);
    }

    #[test]
    fn test_unknown_words_map_to_oov_index() {
        let options = TokenizerOptions {
            oov_token: Some("<OOV>".to_string()),
            ..Default::default()
        };
        let tokenizer = KerasTokenizer::new(options, vocabulary(&["<OOV>", "select"])).unwrap();
        assert_eq!(tokenizer.encode("select name"), vec![2, 1]);
    }

    #[test]
    fn test_num_words_cap_routes_rare_words_to_oov() {
        let options = TokenizerOptions {
            num_words: Some(3),
            oov_token: Some("<OOV>".to_string()),
            ..Default::default()
        };
        // indices: <OOV>=1, select=2, union=3
        let tokenizer =
            KerasTokenizer::new(options, vocabulary(&["<OOV>", "select", "union"])).unwrap();
        assert_eq!(tokenizer.encode("select union"), vec![2, 1]);
    }

    #[test]
    fn test_num_words_cap_drops_rare_words_without_oov() {
        let options = TokenizerOptions {
            num_words: Some(2),
            ..Default::default()
        };
        let tokenizer = KerasTokenizer::new(options, vocabulary(&["select", "union"])).unwrap();
        assert_eq!(tokenizer.encode("union select"), vec![1]);
    }

    #[test]
    fn test_zero_num_words_is_uncapped() {
        let options = TokenizerOptions {
            num_words: Some(0),
            ..Default::default()
        };
        let tokenizer = KerasTokenizer::new(options, vocabulary(&["select", "union"])).unwrap();
        assert_eq!(tokenizer.encode("union select"), vec![2, 1]);
    }

    #[test]
    fn test_char_level_ignores_filters() {
        let options = TokenizerOptions {
            char_level: true,
            ..Default::default()
        };
        let tokenizer = KerasTokenizer::new(options, vocabulary(&["'", "o", "r"])).unwrap();
        assert_eq!(tokenizer.encode("'OR"), vec![1, 2, 3]);
    }

    #[test]
    fn test_lower_false_keeps_case() {
        let options = TokenizerOptions {
            lower: false,
            ..Default::default()
        };
        let tokenizer = KerasTokenizer::new(options, vocabulary(&["SELECT"])).unwrap();
        assert_eq!(tokenizer.encode("SELECT select"), vec![1]);
    }

    #[test]
    fn test_empty_and_metacharacter_only_text() {
        let tokenizer =
            KerasTokenizer::new(TokenizerOptions::default(), vocabulary(&["select"])).unwrap();
        assert!(tokenizer.encode("").is_empty());
        assert!(tokenizer.encode("'\";--/**/").is_empty());
    }

    #[test]
    fn test_from_json_with_encoded_word_index() {
        let raw = r##"{
            "class_name": "Tokenizer",
            "config": {
                "num_words": null,
                "filters": "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n",
                "lower": true,
                "split": " ",
                "char_level": false,
                "oov_token": "<OOV>",
                "document_count": 2,
                "word_index": "{\"<OOV>\": 1, \"or\": 2, \"1\": 3}"
            }
        }"##;
        let tokenizer = KerasTokenizer::from_json(raw).unwrap();
        assert_eq!(tokenizer.vocabulary_size(), 3);
        assert_eq!(tokenizer.encode("' OR 1=1 -- drop"), vec![1, 2, 3, 3, 1]);
    }

    #[test]
    fn test_from_json_rejects_other_documents() {
        let raw = r#"{"class_name": "Sequential", "config": {"word_index": {}}}"#;
        assert!(matches!(
            KerasTokenizer::from_json(raw),
            Err(Error::Artifact(_))
        ));
    }

    #[test]
    fn test_from_file_missing_is_artifact_error() {
        let err = KerasTokenizer::from_file("/nonexistent/tokenizer.json").unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
    }
}
