//! Round selection: sample questions without replacement and shuffle answers.

use rand::{
    seq::{index, SliceRandom},
    Rng,
};

use crate::catalog::QuestionRecord;

/// One question as presented in a specific round, with its options permuted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` (after permutation) of the right answer.
    pub correct: usize,
}

impl RoundQuestion {
    /// Copy `rec` with a uniformly random option order.
    pub fn shuffled<R: Rng + ?Sized>(rec: &QuestionRecord, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..rec.options.len()).collect();
        order.shuffle(rng);

        let mut correct = 0;
        let options = order
            .iter()
            .enumerate()
            .map(|(pos, &src)| {
                if src == rec.correct {
                    correct = pos;
                }
                rec.options[src].clone()
            })
            .collect();

        Self {
            prompt: rec.prompt.clone(),
            options,
            correct,
        }
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct]
    }
}

/// Draw `min(n, pool.len())` distinct records and shuffle each one's options.
pub fn draw<R: Rng + ?Sized>(
    pool: &[&QuestionRecord],
    n: usize,
    rng: &mut R,
) -> Vec<RoundQuestion> {
    let amount = n.min(pool.len());
    index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| RoundQuestion::shuffled(pool[i], rng))
        .collect()
}
