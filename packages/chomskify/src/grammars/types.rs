use std::fmt::Display;

use derive_more::Display;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use crate::language::{Symbol, Word, EPSILON};

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Terminal(pub Symbol);

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonTerminal(pub Symbol);

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub enum ProductionSymbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl ProductionSymbol {
    pub fn symbol(&self) -> &Symbol {
        match self {
            ProductionSymbol::Terminal(terminal) => &terminal.0,
            ProductionSymbol::NonTerminal(non_terminal) => &non_terminal.0,
        }
    }
}

// Each grammar kind restricts the shape of its rules, so each picks its own
// representation and lowers it to a plain symbol word on demand.
pub trait ProductionWord: Display + Clone {
    fn to_word(&self) -> Word<ProductionSymbol>;
}

impl ProductionWord for Word<ProductionSymbol> {
    fn to_word(&self) -> Word<ProductionSymbol> {
        Word(self.0.clone())
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[display("start symbol {start} is not a declared variable")]
    MissingStartSymbol { start: NonTerminal },
    #[display("production head {variable} is not a declared variable")]
    UndeclaredVariable { variable: NonTerminal },
    #[display("symbol {symbol} in a rule of {variable} is not declared")]
    UndeclaredSymbol {
        symbol: Symbol,
        variable: NonTerminal,
    },
    #[display("symbol {symbol} is declared both as a variable and as a terminal")]
    AmbiguousSymbol { symbol: Symbol },
    #[display("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

impl std::error::Error for GrammarError {}

pub trait Grammar<R: ProductionWord> {
    fn start_symbol(&self) -> &NonTerminal;

    fn variables(&self) -> &IndexSet<NonTerminal>;

    fn terminals(&self) -> &IndexSet<Terminal>;

    fn productions(&self) -> &IndexMap<NonTerminal, IndexSet<R>>;

    // Erasing rules that are not part of the production map itself; normal
    // forms that keep ε out of their rule shape report them here.
    fn erasing_variables(&self) -> IndexSet<NonTerminal> {
        IndexSet::new()
    }

    fn definition(&self) -> String {
        let start_symbol = self.start_symbol();

        let mut variables = self.variables().clone();
        variables.sort_by(|a, b| {
            if a == start_symbol {
                return std::cmp::Ordering::Less;
            }
            if b == start_symbol {
                return std::cmp::Ordering::Greater;
            }
            a.cmp(b)
        });

        let mut terminals = self.terminals().clone();
        terminals.sort();

        let mut definition = format!(
            "G = ({{{}}}, {{{}}}, P, {})\n\n",
            variables.iter().join(", "),
            terminals.iter().join(", "),
            start_symbol
        );

        definition += "P = {\n";

        let erasing_variables = self.erasing_variables();

        for variable in &variables {
            let mut alternatives = self
                .productions()
                .get(variable)
                .map(|words| words.iter().map(ToString::to_string).collect::<Vec<_>>())
                .unwrap_or_default();

            if erasing_variables.contains(variable) {
                alternatives.push(EPSILON.to_owned());
            }

            if !alternatives.is_empty() {
                definition += &format!("  {} → {}\n", variable, alternatives.join(" | "));
            }
        }

        definition += "}\n";

        definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn errors_name_the_offending_symbols() {
        let error = GrammarError::MissingStartSymbol {
            start: NonTerminal(Symbol::new("S")),
        };
        assert_eq!(
            error.to_string(),
            "start symbol S is not a declared variable"
        );

        let error = GrammarError::UndeclaredSymbol {
            symbol: Symbol::new("q"),
            variable: NonTerminal(Symbol::new("A")),
        };
        assert_eq!(error.to_string(), "symbol q in a rule of A is not declared");

        let error = GrammarError::Syntax {
            line: 3,
            message: "missing arrow".to_string(),
        };
        assert_eq!(error.to_string(), "line 3: missing arrow");
    }

    #[test]
    fn production_symbols_display_their_inner_symbol() {
        let terminal = ProductionSymbol::Terminal(Terminal(Symbol::new("a")));
        let non_terminal = ProductionSymbol::NonTerminal(NonTerminal(Symbol::new("S")));

        assert_eq!(terminal.to_string(), "a");
        assert_eq!(non_terminal.to_string(), "S");
    }
}
