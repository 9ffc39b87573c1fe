use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::{
    grammars::types::{Grammar, NonTerminal, ProductionSymbol, ProductionWord, Terminal},
    language::Word,
};

fn nullable_variables<R: ProductionWord>(grammar: &impl Grammar<R>) -> IndexSet<NonTerminal> {
    let mut nullable = grammar.erasing_variables();

    loop {
        let mut changed = false;

        'variables: for (variable, rules) in grammar.productions() {
            if nullable.contains(variable) {
                continue;
            }

            for rule in rules {
                let erasable = rule.to_word().0.iter().all(|symbol| match symbol {
                    ProductionSymbol::NonTerminal(variable) => nullable.contains(variable),
                    ProductionSymbol::Terminal(_) => false,
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

// Breadth-first expansion of the leftmost variable of each sentential form.
// A form is abandoned once its terminals and non-nullable variables alone
// outgrow `max_length`, and as a termination backstop once the form itself
// outgrows a fixed multiple of it (erasing rules are the only way a form can
// shrink back).
pub fn words_up_to<R: ProductionWord>(
    grammar: &impl Grammar<R>,
    max_length: usize,
) -> IndexSet<Word<Terminal>> {
    let erasing = grammar.erasing_variables();

    let has_erasing_rules = !erasing.is_empty()
        || grammar
            .productions()
            .values()
            .flatten()
            .any(|rule| rule.to_word().is_empty());

    let form_limit = if has_erasing_rules {
        2 * max_length + 4
    } else {
        max_length.max(1)
    };

    let nullable = nullable_variables(grammar);

    let start_form = Word(vec![ProductionSymbol::NonTerminal(
        grammar.start_symbol().clone(),
    )]);

    let mut words = IndexSet::new();
    let mut visited = IndexSet::from([start_form.clone()]);
    let mut queue = VecDeque::from([start_form]);

    while let Some(form) = queue.pop_front() {
        let leftmost = form.0.iter().enumerate().find_map(|(position, symbol)| {
            if let ProductionSymbol::NonTerminal(variable) = symbol {
                Some((position, variable.clone()))
            } else {
                None
            }
        });

        let Some((position, variable)) = leftmost else {
            if form.len() <= max_length {
                words.insert(Word::new(form.0.into_iter().filter_map(
                    |symbol| match symbol {
                        ProductionSymbol::Terminal(terminal) => Some(terminal),
                        ProductionSymbol::NonTerminal(_) => None,
                    },
                )));
            }

            continue;
        };

        let mut alternatives = grammar
            .productions()
            .get(&variable)
            .map(|rules| rules.iter().map(ProductionWord::to_word).collect::<Vec<_>>())
            .unwrap_or_default();

        if erasing.contains(&variable) {
            alternatives.push(Word(Vec::new()));
        }

        for alternative in alternatives {
            let mut symbols = Vec::with_capacity(form.len() + alternative.len());
            symbols.extend(form.0[..position].iter().cloned());
            symbols.extend(alternative.0);
            symbols.extend(form.0[position + 1..].iter().cloned());

            if symbols.len() > form_limit {
                continue;
            }

            // Terminals and non-nullable variables each survive into every
            // word the form can still derive.
            let floor = symbols
                .iter()
                .filter(|symbol| match symbol {
                    ProductionSymbol::Terminal(_) => true,
                    ProductionSymbol::NonTerminal(variable) => !nullable.contains(variable),
                })
                .count();

            if floor > max_length {
                continue;
            }

            let next = Word(symbols);
            if visited.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }

    words
}
