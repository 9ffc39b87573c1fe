pub mod chomsky_normal_form;
pub mod context_free;
pub mod derivation;
pub mod parse;
pub mod types;

pub use chomsky_normal_form::{ChomskyNormalFormGrammar, CnfWord, CykTable};
pub use context_free::ContextFreeGrammar;
pub use derivation::words_up_to;
pub use types::{Grammar, GrammarError, NonTerminal, ProductionSymbol, ProductionWord, Terminal};
