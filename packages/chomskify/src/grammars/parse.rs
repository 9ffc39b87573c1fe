use std::str::FromStr;

use indexmap::IndexSet;
use winnow::{
    ascii::space0,
    combinator::{alt, delimited, preceded, repeat, separated, separated_pair},
    token::take_while,
    ModalResult, Parser,
};

use crate::{
    grammars::{
        context_free::ContextFreeGrammar,
        types::{GrammarError, NonTerminal, ProductionSymbol, Terminal},
    },
    language::{Symbol, Word, EPSILON},
};

const HEADER_KEYWORDS: [&str; 3] = ["variables", "terminals", "start"];

fn syntax(line: usize, message: impl Into<String>) -> GrammarError {
    GrammarError::Syntax {
        line,
        message: message.into(),
    }
}

fn expected_header(line: &str, name: &str) -> String {
    if line.starts_with(&format!("{name}:")) {
        format!("malformed {name} header")
    } else {
        format!("expected a {name} header")
    }
}

fn symbol(input: &mut &str) -> ModalResult<Symbol> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '|' && c != '#')
        .verify(|name: &str| name != "->" && name != "→" && name != EPSILON)
        .map(Symbol::new)
        .parse_next(input)
}

fn symbols(input: &mut &str) -> ModalResult<Vec<Symbol>> {
    repeat(0.., preceded(space0, symbol)).parse_next(input)
}

fn variables_line(input: &mut &str) -> ModalResult<Vec<Symbol>> {
    preceded("variables:", symbols).parse_next(input)
}

fn terminals_line(input: &mut &str) -> ModalResult<Vec<Symbol>> {
    preceded("terminals:", symbols).parse_next(input)
}

fn start_line(input: &mut &str) -> ModalResult<Symbol> {
    preceded(("start:", space0), symbol).parse_next(input)
}

fn alternative(input: &mut &str) -> ModalResult<Vec<Symbol>> {
    alt((
        EPSILON.value(Vec::new()),
        repeat(1.., preceded(space0, symbol)),
    ))
    .parse_next(input)
}

fn rule_line(input: &mut &str) -> ModalResult<(Symbol, Vec<Vec<Symbol>>)> {
    separated_pair(
        symbol,
        delimited(space0, alt(("->", "→")), space0),
        separated(1.., alternative, delimited(space0, '|', space0)),
    )
    .parse_next(input)
}

impl ContextFreeGrammar {
    /// Parses the line-oriented grammar notation. The three alphabet headers
    /// open the grammar, in this order, followed by one rule per line:
    ///
    /// ```text
    /// # a comment
    /// variables: S A
    /// terminals: a b
    /// start: S
    ///
    /// S -> a S b | A
    /// A -> ε
    /// ```
    ///
    /// `→` is accepted for `->`, symbols are whitespace-separated tokens (so
    /// multi-character names compose unambiguously) and `ε` stands alone as an
    /// erasing alternative. The grammar is validated before it is returned.
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        let mut variables: Option<Vec<Symbol>> = None;
        let mut terminals: Option<Vec<Symbol>> = None;
        let mut start: Option<Symbol> = None;
        let mut rules: Vec<(Symbol, Vec<Vec<Symbol>>)> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = match raw.split_once('#') {
                Some((content, _)) => content,
                None => raw,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            let line_number = index + 1;

            if variables.is_none() {
                let parsed = variables_line
                    .parse(line)
                    .map_err(|_| syntax(line_number, expected_header(line, "variables")))?;
                variables = Some(parsed);
            } else if terminals.is_none() {
                let parsed = terminals_line
                    .parse(line)
                    .map_err(|_| syntax(line_number, expected_header(line, "terminals")))?;
                terminals = Some(parsed);
            } else if start.is_none() {
                let parsed = start_line
                    .parse(line)
                    .map_err(|_| syntax(line_number, expected_header(line, "start")))?;
                start = Some(parsed);
            } else if let Some(name) = HEADER_KEYWORDS
                .iter()
                .find(|name| line.starts_with(&format!("{name}:")))
            {
                return Err(syntax(line_number, format!("duplicate {name} header")));
            } else if !line.contains("->") && !line.contains('→') {
                return Err(syntax(line_number, "missing arrow"));
            } else {
                let rule = rule_line
                    .parse(line)
                    .map_err(|_| syntax(line_number, "malformed rule"))?;
                rules.push(rule);
            }
        }

        let end = text.lines().count() + 1;

        let Some(variables) = variables else {
            return Err(syntax(end, "expected a variables header"));
        };
        let Some(terminals) = terminals else {
            return Err(syntax(end, "expected a terminals header"));
        };
        let Some(start) = start else {
            return Err(syntax(end, "expected a start header"));
        };

        let variables = variables.into_iter().collect::<IndexSet<_>>();
        let terminals = terminals.into_iter().collect::<IndexSet<_>>();

        let mut grammar = ContextFreeGrammar::new(
            variables.iter().cloned().map(NonTerminal),
            terminals.iter().cloned().map(Terminal),
            NonTerminal(start),
        );

        for (head, alternatives) in rules {
            for alternative in alternatives {
                // Names outside the declared terminals are read as variables,
                // so validation reports anything undeclared.
                let word = Word::new(alternative.into_iter().map(|symbol| {
                    if terminals.contains(&symbol) {
                        ProductionSymbol::Terminal(Terminal(symbol))
                    } else {
                        ProductionSymbol::NonTerminal(NonTerminal(symbol))
                    }
                }));

                grammar.add_production(NonTerminal(head.clone()), word);
            }
        }

        grammar.validate()?;

        Ok(grammar)
    }
}

impl FromStr for ContextFreeGrammar {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
