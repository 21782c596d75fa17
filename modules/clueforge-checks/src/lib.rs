//! Pure, synchronous checks over a clue candidate. Nothing here calls a
//! model or suspends.

pub mod auditor;
pub mod lexicon;
pub mod mechanic;
pub mod referee;
pub mod surface;

pub use auditor::{DoubleDutyVerdict, RuleAuditor};
pub use lexicon::{Lexicon, WordListLexicon};
pub use mechanic::{all_valid, feedback_for, hidden_word_precheck, validate};
pub use referee::{Referee, RefereeVerdict};
pub use surface::check_surface;
