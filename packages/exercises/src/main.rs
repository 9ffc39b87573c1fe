use chomskify::{
    grammars::{words_up_to, ContextFreeGrammar, Grammar, Terminal},
    language::{Symbol, Word},
};

fn chomsky_normalization() {
    // let cfg: ContextFreeGrammar = "
    // variables: S A B
    // terminals: a b c
    // start: S
    //
    // S -> A a | B | c
    // A -> a | B c a | B
    // B -> ε | A | b b
    // "
    // .parse()
    // .unwrap();

    let cfg: ContextFreeGrammar = "
    variables: S A B C D
    terminals: a b
    start: S

    S -> A C
    A -> a | A | S | C | a D | b A B | ε
    B -> a | b S
    C -> A B
    D -> B B
    "
    .parse()
    .unwrap();

    println!("Context-Free Grammar:\n{}", cfg.definition());

    let cnf = cfg.to_chomsky_normal_form().unwrap();
    println!("Chomsky Normal Form:\n{}", cnf.definition());

    let word = Word::new("baa".chars().map(|c| Terminal(Symbol::new(c))));
    println!("{}", cnf.cyk(&word));

    let words = words_up_to(&cfg, 4)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Words of length at most 4: {words}");
}

fn main() {
    chomsky_normalization();
}
