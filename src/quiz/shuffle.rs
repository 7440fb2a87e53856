// src/quiz/shuffle.rs

use serde::Serialize;

use super::rng::Mulberry32;
use crate::models::question::Question;

/// One option in display order, remembering where it sat originally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffledOption {
    pub original_index: usize,
    pub text: String,
}

/// Fisher-Yates over `(original_index, text)` pairs, from the last slot down to 1.
///
/// `rng` is advanced, not reset: callers shuffling several questions must pass
/// the same generator so the whole session replays from one seed.
pub fn shuffle_options(options: &[String], rng: &mut Mulberry32) -> Vec<ShuffledOption> {
    let mut arr: Vec<ShuffledOption> = options
        .iter()
        .enumerate()
        .map(|(original_index, text)| ShuffledOption {
            original_index,
            text: text.clone(),
        })
        .collect();

    for i in (1..arr.len()).rev() {
        let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
        arr.swap(i, j);
    }
    arr
}

/// Shuffles every question in order with one generator seeded from `seed`.
pub fn shuffle_all(questions: &[Question], seed: u32) -> Vec<Vec<ShuffledOption>> {
    let mut rng = Mulberry32::new(seed);
    questions
        .iter()
        .map(|q| shuffle_options(&q.options, &mut rng))
        .collect()
}
