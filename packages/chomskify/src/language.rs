use std::fmt::Display;

use itertools::Itertools;

pub const EPSILON: &str = "ε";

// Symbol names may span several characters, so a word is a sequence of
// symbols, never a concatenated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        assert!(!s.is_empty());
        Symbol(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The empty word stands for ε.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word<T>(pub Vec<T>);

impl<T> Word<T> {
    pub fn new(symbols: impl IntoIterator<Item = T>) -> Self {
        Word(symbols.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Display> Display for Word<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "{EPSILON}")
        } else {
            write!(f, "{}", self.0.iter().join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn words_display_space_separated() {
        let word = Word(vec![Symbol::new("S"), Symbol::new("plus"), Symbol::new("S")]);
        assert_eq!(word.to_string(), "S plus S");
    }

    #[test]
    fn empty_word_displays_as_epsilon() {
        let word: Word<Symbol> = Word(vec![]);
        assert_eq!(word.to_string(), EPSILON);
    }
}
