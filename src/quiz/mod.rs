// src/quiz/mod.rs

pub mod review;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod shuffle;

pub use rng::Mulberry32;
pub use scoring::score;
pub use session::{QuizSession, SessionRegistry};
pub use shuffle::{ShuffledOption, shuffle_options};
