//! Ukrainian suffix stripping for the lexical analyzer
//!
//! Tantivy ships no Ukrainian snowball stemmer. This filter drops one
//! reflexive particle, then the longest inflectional ending that leaves at
//! least three characters, so "посилка"/"посилку" and
//! "зберігати"/"зберігається" index to the same term. Tokens that are not
//! entirely Cyrillic pass through unchanged. Expects lowercased input.

use tantivy::tokenizer::{Token, TokenFilter, TokenStream, Tokenizer};

const MIN_STEM_CHARS: usize = 3;

const REFLEXIVE: &[&str] = &["ся", "сь"];

/// Longest first
const ENDINGS: &[&str] = &[
    // 4
    "аєть", "яєть", "уєть", "ують", "ають", "яють", "ього", "ьому",
    // 3
    "ати", "яти", "ити", "іти", "ути", "ють", "ать", "ять", "ить", "ємо", "єте", "имо", "ите",
    "ами", "ями", "ові", "еві", "єві", "ого", "ому", "ими", "іми",
    // 2
    "ах", "ях", "ам", "ям", "ом", "ем", "ою", "ею", "ий", "ій", "их", "ім", "ої", "ає", "яє", "ує",
    "ов", "ів", "ей",
    // 1
    "а", "я", "у", "ю", "і", "и", "о", "е", "ь", "є", "ї", "й",
];

/// Stem of a lowercased word
pub fn stem(word: &str) -> &str {
    if word.is_empty() || !word.chars().all(is_cyrillic) {
        return word;
    }

    let mut stem = word;
    if let Some(rest) = REFLEXIVE.iter().find_map(|s| strip(stem, s)) {
        stem = rest;
    }
    ENDINGS.iter().find_map(|s| strip(stem, s)).unwrap_or(stem)
}

fn strip<'a>(word: &'a str, suffix: &str) -> Option<&'a str> {
    word.strip_suffix(suffix)
        .filter(|rest| rest.chars().count() >= MIN_STEM_CHARS)
}

fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// `TokenFilter` applying [`stem`] to every token
#[derive(Clone, Copy, Debug, Default)]
pub struct UkrainianStemmer;

impl TokenFilter for UkrainianStemmer {
    type Tokenizer<T: Tokenizer> = UkrainianStemmerFilter<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> UkrainianStemmerFilter<T> {
        UkrainianStemmerFilter { inner: tokenizer }
    }
}

#[derive(Clone)]
pub struct UkrainianStemmerFilter<T> {
    inner: T,
}

impl<T: Tokenizer> Tokenizer for UkrainianStemmerFilter<T> {
    type TokenStream<'a> = UkrainianStemmerTokenStream<T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        UkrainianStemmerTokenStream {
            tail: self.inner.token_stream(text),
        }
    }
}

pub struct UkrainianStemmerTokenStream<T> {
    tail: T,
}

impl<T: TokenStream> TokenStream for UkrainianStemmerTokenStream<T> {
    fn advance(&mut self) -> bool {
        if !self.tail.advance() {
            return false;
        }
        let token = self.tail.token_mut();
        let len = stem(&token.text).len();
        token.text.truncate(len);
        true
    }

    fn token(&self) -> &Token {
        self.tail.token()
    }

    fn token_mut(&mut self) -> &mut Token {
        self.tail.token_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};

    #[test]
    fn test_inflections_share_stem() {
        assert_eq!(stem("посилка"), stem("посилку"));
        assert_eq!(stem("посилка"), "посилк");
        assert_eq!(stem("зберігати"), stem("зберігається"));
        assert_eq!(stem("зберігати"), "зберіг");
        assert_eq!(stem("відділення"), stem("відділенні"));
    }

    #[test]
    fn test_short_and_foreign_tokens_unchanged() {
        assert_eq!(stem("у"), "у");
        assert_eq!(stem("дні"), "дні");
        assert_eq!(stem("package"), "package");
        assert_eq!(stem("14"), "14");
        assert_eq!(stem(""), "");
    }

    #[test]
    fn test_endings_are_longest_first() {
        for pair in ENDINGS.windows(2) {
            assert!(pair[0].chars().count() >= pair[1].chars().count(), "{:?}", pair);
        }
    }

    #[test]
    fn test_filter_in_analyzer() {
        let mut analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(UkrainianStemmer)
            .build();
        let mut stream = analyzer.token_stream("Посилку ЗБЕРІГАЮТЬ 5 днів");
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        assert_eq!(terms, vec!["посилк", "зберіг", "5", "днів"]);
    }
}
