//! Chess engine core: board substrate, move generation, evaluation and
//! iterative-deepening alpha-beta search. The surrounding game server and
//! UI talk to this crate through [`protocol`] records only.

pub mod engine;
pub mod logic;
pub mod protocol;
