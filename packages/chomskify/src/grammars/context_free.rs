use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use crate::{
    grammars::types::{Grammar, GrammarError, NonTerminal, ProductionSymbol, Terminal},
    language::Word,
};

fn unit_target(word: &Word<ProductionSymbol>) -> Option<&NonTerminal> {
    if word.0.len() == 1 {
        if let ProductionSymbol::NonTerminal(non_terminal) = &word.0[0] {
            return Some(non_terminal);
        }
    }

    None
}

#[derive(Debug, Clone)]
pub struct ContextFreeGrammar {
    pub(super) start_symbol: NonTerminal,
    pub(super) variables: IndexSet<NonTerminal>,
    pub(super) terminals: IndexSet<Terminal>,
    pub(super) productions: IndexMap<NonTerminal, IndexSet<Word<ProductionSymbol>>>,
}

impl Grammar<Word<ProductionSymbol>> for ContextFreeGrammar {
    fn start_symbol(&self) -> &NonTerminal {
        &self.start_symbol
    }

    fn variables(&self) -> &IndexSet<NonTerminal> {
        &self.variables
    }

    fn terminals(&self) -> &IndexSet<Terminal> {
        &self.terminals
    }

    fn productions(&self) -> &IndexMap<NonTerminal, IndexSet<Word<ProductionSymbol>>> {
        &self.productions
    }
}

impl ContextFreeGrammar {
    pub fn new(
        variables: impl IntoIterator<Item = NonTerminal>,
        terminals: impl IntoIterator<Item = Terminal>,
        start_symbol: NonTerminal,
    ) -> Self {
        let variables = variables.into_iter().collect::<IndexSet<_>>();
        let terminals = terminals.into_iter().collect();
        let productions = variables
            .iter()
            .map(|variable| (variable.clone(), IndexSet::new()))
            .collect();

        Self {
            start_symbol,
            variables,
            terminals,
            productions,
        }
    }

    // The empty word is an erasing rule.
    pub fn add_production(&mut self, variable: NonTerminal, word: Word<ProductionSymbol>) {
        self.productions.entry(variable).or_default().insert(word);
    }

    pub fn validate(&self) -> Result<(), GrammarError> {
        for terminal in &self.terminals {
            if self.variables.iter().any(|variable| variable.0 == terminal.0) {
                return Err(GrammarError::AmbiguousSymbol {
                    symbol: terminal.0.clone(),
                });
            }
        }

        if !self.variables.contains(&self.start_symbol) {
            return Err(GrammarError::MissingStartSymbol {
                start: self.start_symbol.clone(),
            });
        }

        for (variable, words) in &self.productions {
            if !self.variables.contains(variable) {
                return Err(GrammarError::UndeclaredVariable {
                    variable: variable.clone(),
                });
            }

            for word in words {
                for symbol in &word.0 {
                    let declared = match symbol {
                        ProductionSymbol::Terminal(terminal) => self.terminals.contains(terminal),
                        ProductionSymbol::NonTerminal(non_terminal) => {
                            self.variables.contains(non_terminal)
                        }
                    };

                    if !declared {
                        return Err(GrammarError::UndeclaredSymbol {
                            symbol: symbol.symbol().clone(),
                            variable: variable.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    pub fn nullable_variables(&self) -> IndexSet<NonTerminal> {
        let mut nullable = IndexSet::new();

        loop {
            let mut changed = false;

            'variables: for (variable, words) in &self.productions {
                if nullable.contains(variable) {
                    continue;
                }

                for word in words {
                    let erasable = word.0.iter().all(|symbol| {
                        if let ProductionSymbol::NonTerminal(non_terminal) = symbol {
                            nullable.contains(non_terminal)
                        } else {
                            false
                        }
                    });

                    if erasable {
                        nullable.insert(variable.clone());

                        changed = true;
                        continue 'variables;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        nullable
    }

    // Compensates for the removed erasing rules by adding every non-empty
    // variant obtained by dropping nullable occurrences. The returned set
    // tells the caller whether the start symbol used to derive the empty word.
    pub fn eliminate_epsilon_productions(&mut self) -> IndexSet<NonTerminal> {
        let nullable = self.nullable_variables();

        for words in self.productions.values_mut() {
            let mut next_words = IndexSet::new();

            for word in words.iter() {
                if word.is_empty() {
                    continue;
                }

                let variants = word
                    .0
                    .iter()
                    .cloned()
                    .map(|symbol| match &symbol {
                        ProductionSymbol::NonTerminal(non_terminal) => {
                            if nullable.contains(non_terminal) {
                                vec![Some(symbol), None]
                            } else {
                                vec![Some(symbol)]
                            }
                        }
                        ProductionSymbol::Terminal(_) => vec![Some(symbol)],
                    })
                    .multi_cartesian_product()
                    .filter_map(|symbols| {
                        let symbols = symbols.into_iter().flatten().collect::<Vec<_>>();
                        if symbols.is_empty() {
                            None
                        } else {
                            Some(Word::new(symbols))
                        }
                    });

                next_words.extend(variants);
            }

            *words = next_words;
        }

        nullable
    }

    pub fn unit_pairs(&self) -> IndexSet<(NonTerminal, NonTerminal)> {
        let mut unit_pairs = IndexSet::new();

        for (variable, words) in &self.productions {
            for word in words {
                if let Some(target) = unit_target(word) {
                    unit_pairs.insert((variable.clone(), target.clone()));
                }
            }
        }

        loop {
            let mut changed = false;

            for (head, via) in unit_pairs.clone() {
                if let Some(words) = self.productions.get(&via) {
                    for word in words {
                        if let Some(target) = unit_target(word) {
                            if unit_pairs.insert((head.clone(), target.clone())) {
                                changed = true;
                            }
                        }
                    }
                }
            }

            if !changed {
                break;
            }
        }

        unit_pairs
    }

    // A unit self-loop contributes nothing and simply disappears.
    pub fn eliminate_unit_productions(&mut self) {
        let unit_pairs = self.unit_pairs();

        let mut inherited = IndexMap::<NonTerminal, IndexSet<Word<ProductionSymbol>>>::new();
        for (head, target) in &unit_pairs {
            if let Some(words) = self.productions.get(target) {
                inherited.entry(head.clone()).or_default().extend(
                    words
                        .iter()
                        .filter(|word| unit_target(word).is_none())
                        .cloned(),
                );
            }
        }

        for words in self.productions.values_mut() {
            words.retain(|word| unit_target(word).is_none());
        }

        for (head, words) in inherited {
            if let Some(existing) = self.productions.get_mut(&head) {
                existing.extend(words);
            }
        }
    }

    pub fn generating_variables(&self) -> IndexSet<NonTerminal> {
        let mut generating = IndexSet::new();

        loop {
            let mut changed = false;

            'variables: for (variable, words) in &self.productions {
                if generating.contains(variable) {
                    continue;
                }

                for word in words {
                    let grounded = word.0.iter().all(|symbol| {
                        if let ProductionSymbol::NonTerminal(non_terminal) = symbol {
                            generating.contains(non_terminal)
                        } else {
                            true
                        }
                    });

                    if grounded {
                        generating.insert(variable.clone());

                        changed = true;
                        continue 'variables;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        generating
    }

    pub fn reachable_variables(&self) -> IndexSet<NonTerminal> {
        let mut reachable = IndexSet::from([self.start_symbol.clone()]);

        loop {
            let mut changed = false;

            for (variable, words) in &self.productions {
                if !reachable.contains(variable) {
                    continue;
                }

                for word in words {
                    for symbol in &word.0 {
                        if let ProductionSymbol::NonTerminal(non_terminal) = symbol {
                            if reachable.insert(non_terminal.clone()) {
                                changed = true;
                            }
                        }
                    }
                }
            }

            if !changed {
                break;
            }
        }

        reachable
    }

    // Both passes inspect the grammar as given, so a variable orphaned only
    // by the rule filtering survives. The start symbol is never dropped, even
    // when its language is empty.
    pub fn remove_useless_symbols(&mut self) {
        let generating = self.generating_variables();
        let reachable = self.reachable_variables();

        let mut useful = IndexSet::from([self.start_symbol.clone()]);
        useful.extend(generating.intersection(&reachable).cloned());

        self.variables.retain(|variable| useful.contains(variable));
        self.productions
            .retain(|variable, _| useful.contains(variable));

        for words in self.productions.values_mut() {
            words.retain(|word| {
                word.0.iter().all(|symbol| {
                    if let ProductionSymbol::NonTerminal(non_terminal) = symbol {
                        useful.contains(non_terminal)
                    } else {
                        true
                    }
                })
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::language::Symbol;

    // Uppercase letters are variables, lowercase letters are terminals and ε
    // stands for the empty word.
    fn grammar(start: char, rules: &[(char, &str)]) -> ContextFreeGrammar {
        let mut variables = IndexSet::new();
        let mut terminals = IndexSet::new();

        for (head, body) in rules {
            variables.insert(NonTerminal(Symbol::new(*head)));

            for c in body.chars() {
                if c.is_ascii_uppercase() {
                    variables.insert(NonTerminal(Symbol::new(c)));
                } else if c.is_ascii_lowercase() {
                    terminals.insert(Terminal(Symbol::new(c)));
                }
            }
        }

        let mut grammar =
            ContextFreeGrammar::new(variables, terminals, NonTerminal(Symbol::new(start)));

        for (head, body) in rules {
            for alternative in body.split('|') {
                let symbols = alternative
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != 'ε')
                    .map(|c| {
                        if c.is_ascii_uppercase() {
                            ProductionSymbol::NonTerminal(NonTerminal(Symbol::new(c)))
                        } else {
                            ProductionSymbol::Terminal(Terminal(Symbol::new(c)))
                        }
                    });

                grammar.add_production(NonTerminal(Symbol::new(*head)), Word::new(symbols));
            }
        }

        grammar
    }

    fn rules_of(grammar: &ContextFreeGrammar, variable: char) -> Vec<String> {
        let mut rules = grammar.productions[&NonTerminal(Symbol::new(variable))]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        rules.sort();
        rules
    }

    #[test]
    fn nullable_variables_close_over_all_nullable_bodies() {
        let grammar = grammar('S', &[('S', "AA"), ('A', "ε | a")]);

        let nullable = grammar.nullable_variables();

        assert_eq!(
            nullable,
            IndexSet::from([
                NonTerminal(Symbol::new('A')),
                NonTerminal(Symbol::new('S'))
            ])
        );
    }

    #[test]
    fn epsilon_elimination_expands_nullable_occurrences() {
        let mut grammar = grammar('S', &[('S', "AbA"), ('A', "a | ε")]);

        let nullable = grammar.eliminate_epsilon_productions();

        assert_eq!(nullable, IndexSet::from([NonTerminal(Symbol::new('A'))]));
        assert_eq!(rules_of(&grammar, 'S'), ["A b", "A b A", "b", "b A"]);
        assert_eq!(rules_of(&grammar, 'A'), ["a"]);
    }

    #[test]
    fn epsilon_elimination_never_introduces_an_empty_variant() {
        let mut grammar = grammar('S', &[('S', "AA"), ('A', "ε | a")]);

        let nullable = grammar.eliminate_epsilon_productions();

        assert!(nullable.contains(&NonTerminal(Symbol::new('S'))));
        assert_eq!(rules_of(&grammar, 'S'), ["A", "A A"]);
        assert!(grammar
            .productions
            .values()
            .flatten()
            .all(|word| !word.is_empty()));
    }

    #[test]
    fn unit_elimination_flattens_chains() {
        let mut grammar = grammar('A', &[('A', "B"), ('B', "C"), ('C', "c")]);

        grammar.eliminate_unit_productions();

        assert_eq!(rules_of(&grammar, 'A'), ["c"]);
        assert_eq!(rules_of(&grammar, 'B'), ["c"]);
        assert_eq!(rules_of(&grammar, 'C'), ["c"]);
    }

    #[test]
    fn unit_elimination_handles_cycles() {
        let mut grammar = grammar('A', &[('A', "B | a"), ('B', "A")]);

        grammar.eliminate_unit_productions();

        assert_eq!(rules_of(&grammar, 'A'), ["a"]);
        assert_eq!(rules_of(&grammar, 'B'), ["a"]);
    }

    #[test]
    fn unit_self_loop_disappears() {
        let mut grammar = grammar('A', &[('A', "A | a")]);

        grammar.eliminate_unit_productions();

        assert_eq!(rules_of(&grammar, 'A'), ["a"]);
    }

    #[test]
    fn useless_symbol_removal_intersects_independent_passes() {
        let mut grammar = grammar('S', &[('S', "AB | a"), ('A', "a"), ('B', "Bb")]);

        grammar.remove_useless_symbols();

        assert!(!grammar.variables.contains(&NonTerminal(Symbol::new('B'))));
        assert!(grammar.variables.contains(&NonTerminal(Symbol::new('A'))));
        assert_eq!(rules_of(&grammar, 'S'), ["a"]);
        assert_eq!(rules_of(&grammar, 'A'), ["a"]);
    }

    #[test]
    fn useless_symbol_removal_drops_an_unreachable_variable() {
        let mut grammar = grammar('S', &[('S', "a"), ('A', "b")]);

        grammar.remove_useless_symbols();

        assert!(!grammar.variables.contains(&NonTerminal(Symbol::new('A'))));
        assert!(!grammar.productions.contains_key(&NonTerminal(Symbol::new('A'))));
        assert_eq!(rules_of(&grammar, 'S'), ["a"]);
    }

    #[test]
    fn useless_symbol_removal_keeps_a_non_generating_start() {
        let mut grammar = grammar('S', &[('S', "SA"), ('A', "a")]);

        grammar.remove_useless_symbols();

        assert!(grammar.variables.contains(&NonTerminal(Symbol::new('S'))));
    }

    #[test]
    fn validation_rejects_undeclared_symbols() {
        let mut grammar = grammar('S', &[('S', "a")]);
        grammar.add_production(
            NonTerminal(Symbol::new('S')),
            Word::new([ProductionSymbol::Terminal(Terminal(Symbol::new('z')))]),
        );

        assert_eq!(
            grammar.validate(),
            Err(GrammarError::UndeclaredSymbol {
                symbol: Symbol::new('z'),
                variable: NonTerminal(Symbol::new('S')),
            })
        );
    }

    #[test]
    fn validation_rejects_an_ambiguous_symbol() {
        let grammar = ContextFreeGrammar::new(
            [NonTerminal(Symbol::new('S'))],
            [Terminal(Symbol::new('S'))],
            NonTerminal(Symbol::new('S')),
        );

        assert_eq!(
            grammar.validate(),
            Err(GrammarError::AmbiguousSymbol {
                symbol: Symbol::new('S'),
            })
        );
    }

    #[test]
    fn validation_rejects_an_undeclared_start_symbol() {
        let grammar = ContextFreeGrammar::new(
            [NonTerminal(Symbol::new('A'))],
            [Terminal(Symbol::new('a'))],
            NonTerminal(Symbol::new('S')),
        );

        assert_eq!(
            grammar.validate(),
            Err(GrammarError::MissingStartSymbol {
                start: NonTerminal(Symbol::new('S')),
            })
        );
    }

    #[test]
    fn definitions_list_the_start_symbol_first() {
        let grammar = grammar('S', &[('S', "aA | b"), ('A', "a")]);

        assert_eq!(
            grammar.definition(),
            "G = ({S, A}, {a, b}, P, S)\n\n\
             P = {\n  S → a A | b\n  A → a\n}\n"
        );
    }
}
