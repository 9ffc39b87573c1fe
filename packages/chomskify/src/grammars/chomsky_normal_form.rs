use std::fmt::Display;

use indexmap::{indexset, IndexMap, IndexSet};
use itertools::Itertools;
use tabled::{builder::Builder, settings::Style};

use crate::{
    grammars::{
        context_free::ContextFreeGrammar,
        types::{Grammar, GrammarError, NonTerminal, ProductionSymbol, ProductionWord, Terminal},
    },
    language::{Symbol, Word},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CnfWord {
    Terminal(Terminal),
    NonTerminals(NonTerminal, NonTerminal),
}

impl Display for CnfWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CnfWord::Terminal(terminal) => write!(f, "{terminal}"),
            CnfWord::NonTerminals(first, second) => write!(f, "{first} {second}"),
        }
    }
}

impl TryFrom<Word<ProductionSymbol>> for CnfWord {
    type Error = String;

    fn try_from(value: Word<ProductionSymbol>) -> Result<Self, Self::Error> {
        if value.0.len() == 1 {
            if let ProductionSymbol::Terminal(terminal) = &value.0[0] {
                Ok(CnfWord::Terminal(terminal.clone()))
            } else {
                Err("Expected a terminal".to_string())
            }
        } else if value.0.len() == 2 {
            if let (ProductionSymbol::NonTerminal(first), ProductionSymbol::NonTerminal(second)) =
                (&value.0[0], &value.0[1])
            {
                Ok(CnfWord::NonTerminals(first.clone(), second.clone()))
            } else {
                Err("Expected two non-terminals".to_string())
            }
        } else {
            Err(
                "CnfWord can only be created from a word with one terminal or two non-terminals"
                    .to_string(),
            )
        }
    }
}

impl ProductionWord for CnfWord {
    fn to_word(&self) -> Word<ProductionSymbol> {
        match self {
            CnfWord::Terminal(terminal) => {
                Word(vec![ProductionSymbol::Terminal(terminal.clone())])
            }
            CnfWord::NonTerminals(first, second) => Word(vec![
                ProductionSymbol::NonTerminal(first.clone()),
                ProductionSymbol::NonTerminal(second.clone()),
            ]),
        }
    }
}

// The prefix grows by one underscore until no declared name starts with it,
// so a counter suffix alone guarantees fresh names.
#[derive(Debug)]
struct FreshNames {
    prefix: String,
    counter: usize,
}

impl FreshNames {
    fn new(variables: &IndexSet<NonTerminal>, terminals: &IndexSet<Terminal>) -> Self {
        let mut prefix = String::from("X");

        let collides = |prefix: &str| {
            variables
                .iter()
                .map(|variable| variable.0.as_str())
                .chain(terminals.iter().map(|terminal| terminal.0.as_str()))
                .any(|name| name.starts_with(prefix))
        };

        while collides(&prefix) {
            prefix.push('_');
        }

        FreshNames { prefix, counter: 0 }
    }

    fn fresh(&mut self) -> NonTerminal {
        self.counter += 1;
        NonTerminal(Symbol::new(format!("{}{}", self.prefix, self.counter)))
    }
}

#[derive(Debug, Clone)]
pub struct ChomskyNormalFormGrammar {
    pub(super) start_symbol: NonTerminal,
    pub(super) derives_epsilon: bool,
    pub(super) variables: IndexSet<NonTerminal>,
    pub(super) terminals: IndexSet<Terminal>,
    pub(super) productions: IndexMap<NonTerminal, IndexSet<CnfWord>>,
}

impl Grammar<CnfWord> for ChomskyNormalFormGrammar {
    fn start_symbol(&self) -> &NonTerminal {
        &self.start_symbol
    }

    fn variables(&self) -> &IndexSet<NonTerminal> {
        &self.variables
    }

    fn terminals(&self) -> &IndexSet<Terminal> {
        &self.terminals
    }

    fn productions(&self) -> &IndexMap<NonTerminal, IndexSet<CnfWord>> {
        &self.productions
    }

    fn erasing_variables(&self) -> IndexSet<NonTerminal> {
        if self.derives_epsilon {
            indexset! {self.start_symbol.clone()}
        } else {
            IndexSet::new()
        }
    }
}

#[derive(Debug)]
pub struct CykTable {
    table: Vec<Vec<IndexSet<NonTerminal>>>,
    word: String,
    start_symbol: NonTerminal,
}

impl CykTable {
    pub fn new(size: usize, word: impl Into<String>, start_symbol: &NonTerminal) -> Self {
        CykTable {
            table: vec![vec![IndexSet::new(); size]; size],
            word: word.into(),
            start_symbol: start_symbol.clone(),
        }
    }

    pub fn contains(&self, i: usize, j: usize, value: &NonTerminal) -> bool {
        self.table[i][j].contains(value)
    }

    pub fn get(&self, i: usize, j: usize) -> &IndexSet<NonTerminal> {
        &self.table[i][j]
    }

    pub fn insert(&mut self, i: usize, j: usize, value: NonTerminal) {
        self.table[i][j].insert(value);
    }

    pub fn is_word_in_language(&self) -> bool {
        if self.table.is_empty() {
            return false;
        }

        self.table[0][self.table.len() - 1].contains(&self.start_symbol)
    }
}

impl Display for CykTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "CYK Table for word \"{}\":", self.word)?;

        let mut builder = Builder::default();

        for (i, row) in self.table.iter().enumerate() {
            builder.push_record(row.iter().enumerate().map(|(j, s)| {
                if j >= i {
                    format!(
                        "V_{},{} = {}",
                        i + 1,
                        j + 1,
                        if s.is_empty() {
                            "∅".to_string()
                        } else {
                            format!("{{{}}}", s.iter().map(ToString::to_string).join(", "))
                        }
                    )
                } else {
                    String::new()
                }
            }));
        }

        builder.insert_record(0, (1..=self.table.len()).map(|j| format!("j = {}", j)));
        builder.insert_column(
            0,
            std::iter::once(String::new())
                .chain((1..=self.table.len()).map(|i| format!("i = {}", i))),
        );

        let mut table = builder.build();
        table.with(Style::rounded());

        writeln!(f, "{}", table)?;

        writeln!(
            f,
            "The word \"{}\" is {} in the language defined by the grammar, as the start symbol {} {} in the top-right cell.",
            self.word,
            if self.is_word_in_language() {
                "accepted"
            } else {
                "not accepted"
            },
            self.start_symbol,
            if self.is_word_in_language() {
                "is"
            } else {
                "is not"
            }
        )?;

        Ok(())
    }
}

impl ChomskyNormalFormGrammar {
    // Erasing rules, then unit rules, then useless symbols, then terminal
    // isolation and binarization. Validation runs up front so the stages
    // never meet an undeclared symbol.
    pub fn from_context_free_grammar(grammar: &ContextFreeGrammar) -> Result<Self, GrammarError> {
        grammar.validate()?;

        let mut grammar = grammar.clone();
        let nullable = grammar.eliminate_epsilon_productions();
        let derives_epsilon = nullable.contains(&grammar.start_symbol);
        grammar.eliminate_unit_productions();
        grammar.remove_useless_symbols();

        let mut fresh_names = FreshNames::new(&grammar.variables, &grammar.terminals);
        let mut proxies = IndexMap::<Terminal, NonTerminal>::new();
        let mut fresh_productions = IndexMap::<NonTerminal, IndexSet<CnfWord>>::new();
        let mut productions = IndexMap::<NonTerminal, IndexSet<CnfWord>>::new();

        for (variable, words) in &grammar.productions {
            let rules = productions.entry(variable.clone()).or_default();

            for word in words {
                if word.0.len() == 1 {
                    match &word.0[0] {
                        ProductionSymbol::Terminal(terminal) => {
                            rules.insert(CnfWord::Terminal(terminal.clone()));
                        }
                        ProductionSymbol::NonTerminal(_) => {
                            panic!("Unit productions should have been eliminated")
                        }
                    }

                    continue;
                }

                let symbols = word
                    .0
                    .iter()
                    .map(|symbol| match symbol {
                        ProductionSymbol::NonTerminal(non_terminal) => non_terminal.clone(),
                        ProductionSymbol::Terminal(terminal) => proxies
                            .entry(terminal.clone())
                            .or_insert_with(|| fresh_names.fresh())
                            .clone(),
                    })
                    .collect::<Vec<_>>();

                let mut head = symbols[0].clone();
                for symbol in &symbols[1..symbols.len() - 1] {
                    let helper = fresh_names.fresh();
                    fresh_productions
                        .entry(helper.clone())
                        .or_default()
                        .insert(CnfWord::NonTerminals(head, symbol.clone()));
                    head = helper;
                }

                rules.insert(CnfWord::NonTerminals(
                    head,
                    symbols[symbols.len() - 1].clone(),
                ));
            }
        }

        let mut variables = grammar.variables.clone();
        variables.extend(proxies.values().cloned());
        variables.extend(fresh_productions.keys().cloned());

        for (terminal, proxy) in &proxies {
            productions
                .entry(proxy.clone())
                .or_default()
                .insert(CnfWord::Terminal(terminal.clone()));
        }

        productions.extend(fresh_productions);

        Ok(Self {
            start_symbol: grammar.start_symbol,
            derives_epsilon,
            variables,
            terminals: grammar.terminals,
            productions,
        })
    }

    pub fn derives_epsilon(&self) -> bool {
        self.derives_epsilon
    }

    pub fn to_context_free_grammar(&self) -> ContextFreeGrammar {
        let mut grammar = ContextFreeGrammar::new(
            self.variables.iter().cloned(),
            self.terminals.iter().cloned(),
            self.start_symbol.clone(),
        );

        for (variable, words) in &self.productions {
            for word in words {
                grammar.add_production(variable.clone(), word.to_word());
            }
        }

        if self.derives_epsilon {
            grammar.add_production(self.start_symbol.clone(), Word(Vec::new()));
        }

        grammar
    }

    pub fn cyk(&self, word: &Word<Terminal>) -> CykTable {
        let terminals = &word.0;

        let n = terminals.len();
        let mut table = CykTable::new(n, word.to_string(), &self.start_symbol);

        for (variable, words) in &self.productions {
            for rule in words {
                if let CnfWord::Terminal(t) = rule {
                    for (i, terminal) in terminals.iter().enumerate() {
                        if terminal == t {
                            table.insert(i, i, variable.clone());
                        }
                    }
                }
            }
        }

        for d in 0..n.saturating_sub(1) {
            for i in 0..n - d - 1 {
                let j = i + d + 1;

                for k in i..j {
                    for (variable, words) in &self.productions {
                        for rule in words {
                            if let CnfWord::NonTerminals(first, second) = rule {
                                if table.contains(i, k, first) && table.contains(k + 1, j, second) {
                                    table.insert(i, j, variable.clone());
                                }
                            }
                        }
                    }
                }
            }
        }

        table
    }

    pub fn recognises(&self, word: &Word<Terminal>) -> bool {
        if word.is_empty() {
            return self.derives_epsilon;
        }

        self.cyk(word).is_word_in_language()
    }
}

impl ContextFreeGrammar {
    pub fn to_chomsky_normal_form(&self) -> Result<ChomskyNormalFormGrammar, GrammarError> {
        ChomskyNormalFormGrammar::from_context_free_grammar(self)
    }
}
