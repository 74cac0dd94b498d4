/// Case-folded token stream of one utterance.
///
/// Tokens are split on whitespace and punctuation; `-` and `/` stay inside a token so
/// `2023-24`, `real-time` and `play-by-play` survive as single tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<String>,
}

impl Tokens {
    pub fn new(utterance: &str) -> Self {
        let lowered = utterance.trim().to_lowercase();
        let tokens = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '/' || c == '_'))
            .map(|t| t.trim_matches(|c| c == '-' || c == '/'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { tokens }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.tokens.get(idx).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t == word)
    }

    /// Start positions of every occurrence of `phrase` (space separated words).
    pub fn phrase_positions(&self, phrase: &str) -> Vec<usize> {
        let words: Vec<&str> = phrase.split(' ').collect();
        self.word_positions(&words)
    }

    pub fn word_positions(&self, words: &[&str]) -> Vec<usize> {
        if words.is_empty() || words.len() > self.tokens.len() {
            return Vec::new();
        }
        (0..=self.tokens.len() - words.len())
            .filter(|start| {
                words
                    .iter()
                    .enumerate()
                    .all(|(offset, w)| self.tokens[start + offset] == *w)
            })
            .collect()
    }

    pub fn contains_phrase(&self, phrase: &str) -> bool {
        !self.phrase_positions(phrase).is_empty()
    }
}

/// Small number words used in "last five games" style phrases.
pub fn parse_count(token: &str) -> Option<i64> {
    if let Ok(n) = token.parse::<i64>() {
        return Some(n);
    }
    let n = match token {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        _ => return None,
    };
    Some(n)
}
