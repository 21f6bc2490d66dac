//! Score & pool engine.
//!
//! Pure functions over letters: weighted pool generation, balanced pool
//! generation, word scoring, and the multiset feasibility check used before a
//! word is submitted.
//!
//! Scores computed here are predictions. In networked play the server's
//! outcome message is authoritative; these functions exist for optimistic
//! local checks and for offline practice rounds.
//!
//! # Length bonus
//!
//! ```text
//! len:    1  2  3  4  5  6  7  8  9
//! bonus:  0  0  0  0  2  4  9 14 19
//! ```
//!
//! +2 per character beyond the 4th, plus +3 per character beyond the 6th.

use lexo_proto::Letter;
use rand::{Rng, seq::SliceRandom};

/// Static properties of one letter of the alphabet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterInfo {
    /// The letter, lowercase.
    pub letter: Letter,
    /// Relative draw frequency.
    pub frequency: f64,
    /// Points awarded per occurrence.
    pub value: u32,
}

const fn info(letter: Letter, frequency: f64, value: u32) -> LetterInfo {
    LetterInfo { letter, frequency, value }
}

/// Alphabet with draw frequencies and point values.
pub const ALPHABET: [LetterInfo; 29] = [
    info('a', 11.92, 1),
    info('e', 8.91, 1),
    info('i', 8.60, 1),
    info('ı', 5.12, 1),
    info('n', 7.49, 1),
    info('r', 6.95, 1),
    info('l', 5.75, 1),
    info('k', 4.72, 2),
    info('d', 4.68, 2),
    info('t', 3.31, 2),
    info('s', 3.00, 2),
    info('m', 2.99, 2),
    info('y', 2.96, 2),
    info('u', 2.88, 2),
    info('o', 2.61, 3),
    info('b', 2.56, 3),
    info('ü', 1.85, 3),
    info('z', 1.50, 4),
    info('ş', 1.48, 4),
    info('ç', 1.14, 4),
    info('g', 1.12, 5),
    info('ğ', 1.12, 5),
    info('p', 0.89, 5),
    info('h', 0.84, 5),
    info('v', 0.82, 5),
    info('c', 0.80, 5),
    info('ö', 0.85, 5),
    info('j', 0.03, 10),
    info('f', 0.44, 5),
];

/// Vowels used to seed balanced pools.
pub const VOWELS: [Letter; 8] = ['a', 'e', 'i', 'ı', 'o', 'ö', 'u', 'ü'];

/// Consonants used to seed balanced pools.
pub const CONSONANTS: [Letter; 21] = [
    'b', 'c', 'ç', 'd', 'f', 'g', 'ğ', 'h', 'j', 'k', 'l', 'm', 'n', 'p', 'r', 's', 'ş', 't', 'v',
    'y', 'z',
];

/// Share of a balanced pool reserved for vowels, in tenths.
const VOWEL_SHARE_TENTHS: usize = 3;

/// Share of a balanced pool reserved for consonants, in tenths.
const CONSONANT_SHARE_TENTHS: usize = 5;

/// Case-fold a single letter. Letters whose lowercase form expands to several
/// characters keep only the base character.
pub fn fold_letter(c: char) -> Letter {
    c.to_lowercase().next().unwrap_or(c)
}

/// Normalize a candidate word: trim surrounding whitespace and case-fold.
pub fn normalize(text: &str) -> String {
    text.trim().chars().map(fold_letter).collect()
}

/// Point value of a single letter. Letters outside the alphabet are worth 0.
pub fn letter_value(letter: Letter) -> u32 {
    let letter = fold_letter(letter);
    ALPHABET.iter().find(|l| l.letter == letter).map_or(0, |l| l.value)
}

/// Whether `letter` is in the vowel set.
pub fn is_vowel(letter: Letter) -> bool {
    VOWELS.contains(&fold_letter(letter))
}

/// Whether `letter` is in the consonant set.
pub fn is_consonant(letter: Letter) -> bool {
    CONSONANTS.contains(&fold_letter(letter))
}

/// Bonus points for a word of `len` characters.
pub fn length_bonus(len: usize) -> u32 {
    let len = len as u32;
    let mut bonus = 0;
    if len > 4 {
        bonus += (len - 4) * 2;
    }
    if len > 6 {
        bonus += (len - 6) * 3;
    }
    bonus
}

/// Predicted score of `word`: letter values plus length bonus, never less than
/// the word's length. Case-insensitive; the empty word scores 0.
pub fn score(word: &str) -> u32 {
    let len = word.chars().count();
    let base: u32 = word.chars().map(letter_value).sum();
    (base + length_bonus(len)).max(len as u32)
}

/// Whether every letter of `word` can be matched to a distinct slot of `pool`.
///
/// Duplicate letters need duplicate slots. Works on a copy; `pool` is never
/// modified. The empty word is always satisfiable.
pub fn has_letters_in_pool(word: &str, pool: &[Letter]) -> bool {
    let mut remaining: Vec<Letter> = pool.iter().copied().map(fold_letter).collect();
    for c in word.chars().map(fold_letter) {
        match remaining.iter().position(|&slot| slot == c) {
            Some(index) => {
                remaining.swap_remove(index);
            },
            None => return false,
        }
    }
    true
}

/// Draw one letter weighted by [`ALPHABET`] frequencies.
pub fn draw_letter<R: Rng + ?Sized>(rng: &mut R) -> Letter {
    // Weights are static and positive, so the weighted choice cannot fail.
    ALPHABET.choose_weighted(rng, |l| l.frequency).map_or('a', |l| l.letter)
}

/// Fill `count` slots with frequency-weighted draws.
pub fn generate_pool<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Letter> {
    (0..count).map(|_| draw_letter(rng)).collect()
}

/// Generate a pool that is guaranteed to be playable.
///
/// At least 30% of the slots are uniform draws from [`VOWELS`] and at least
/// 50% from [`CONSONANTS`]; the remainder are frequency-weighted draws. The
/// result is shuffled.
pub fn generate_balanced_pool<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<Letter> {
    let min_vowels = size * VOWEL_SHARE_TENTHS / 10;
    let min_consonants = size * CONSONANT_SHARE_TENTHS / 10;

    let mut pool = Vec::with_capacity(size);
    pool.extend((0..min_vowels).map(|_| VOWELS[rng.gen_range(0..VOWELS.len())]));
    pool.extend((0..min_consonants).map(|_| CONSONANTS[rng.gen_range(0..CONSONANTS.len())]));
    let rest = size - pool.len();
    pool.extend(generate_pool(rest, rng));

    pool.shuffle(rng);
    pool
}

/// Remove one slot per letter of `word` and append the same number of fresh
/// weighted draws. Pool length is preserved.
pub fn replace_letters<R: Rng + ?Sized>(word: &str, pool: &[Letter], rng: &mut R) -> Vec<Letter> {
    let mut next: Vec<Letter> = pool.to_vec();
    let mut removed = 0;
    for c in word.chars().map(fold_letter) {
        if let Some(index) = next.iter().position(|&slot| fold_letter(slot) == c) {
            next.remove(index);
            removed += 1;
        }
    }
    next.extend(generate_pool(removed, rng));
    next
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn letters(s: &str) -> Vec<Letter> {
        s.chars().collect()
    }

    #[test]
    fn feasibility_respects_duplicates() {
        assert!(!has_letters_in_pool("atam", &letters("atm")));
        assert!(has_letters_in_pool("atam", &letters("aatm")));
    }

    #[test]
    fn feasibility_empty_word() {
        assert!(has_letters_in_pool("", &[]));
        assert!(has_letters_in_pool("", &letters("abc")));
    }

    #[test]
    fn feasibility_does_not_touch_pool() {
        let pool = letters("test");
        assert!(has_letters_in_pool("set", &pool));
        assert_eq!(pool, letters("test"));
    }

    #[test]
    fn feasibility_is_case_insensitive() {
        assert!(has_letters_in_pool("TEST", &letters("tset")));
        assert!(has_letters_in_pool("test", &letters("TSET")));
    }

    #[test]
    fn empty_word_scores_zero() {
        assert_eq!(score(""), 0);
    }

    #[test]
    fn score_is_case_insensitive() {
        assert_eq!(score("test"), score("TEST"));
        assert_eq!(score("test"), score("TeSt"));
    }

    #[test]
    fn score_examples() {
        // t=2 e=1 s=2 t=2, no bonus
        assert_eq!(score("test"), 7);
        // k=2 a=1 l=1 e=1 m=2 = 7, +2 bonus
        assert_eq!(score("kalem"), 9);
        // unknown letters fall back to the length floor
        assert_eq!(score("xxx"), 3);
    }

    #[test]
    fn length_bonus_stacks() {
        assert_eq!(length_bonus(4), 0);
        assert_eq!(length_bonus(5), 2);
        assert_eq!(length_bonus(6), 4);
        assert_eq!(length_bonus(7), 9);
        assert_eq!(length_bonus(9), 19);
    }

    #[test]
    fn balanced_pool_of_sixteen() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let pool = generate_balanced_pool(16, &mut rng);
            assert_eq!(pool.len(), 16);
            assert!(pool.iter().filter(|&&c| is_vowel(c)).count() >= 4);
            assert!(pool.iter().filter(|&&c| is_consonant(c)).count() >= 8);
        }
    }

    #[test]
    fn weighted_pool_uses_alphabet() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pool = generate_pool(500, &mut rng);
        assert_eq!(pool.len(), 500);
        assert!(pool.iter().all(|c| ALPHABET.iter().any(|l| l.letter == *c)));
    }

    #[test]
    fn replace_keeps_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pool = letters("testab");
        let next = replace_letters("test", &pool, &mut rng);
        assert_eq!(next.len(), pool.len());
        assert_eq!(&next[..2], &['a', 'b']);
    }

    #[test]
    fn normalize_trims_and_folds() {
        assert_eq!(normalize("  KaLeM \n"), "kalem");
        assert_eq!(normalize("ŞEKER"), "şeker");
    }

    proptest! {
        #[test]
        fn score_at_least_length(word in "[a-zçğıöşü]{0,20}") {
            prop_assert!(score(&word) as usize >= word.chars().count());
        }

        #[test]
        fn score_ignores_case(word in "[a-z]{0,12}") {
            prop_assert_eq!(score(&word), score(&word.to_uppercase()));
        }

        #[test]
        fn word_built_from_pool_is_feasible(seed in any::<u64>(), take in 0usize..16) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let pool = generate_balanced_pool(16, &mut rng);
            let word: String = pool.iter().take(take).collect();
            prop_assert!(has_letters_in_pool(&word, &pool));
        }

        #[test]
        fn balanced_pool_has_requested_size(seed in any::<u64>(), size in 0usize..64) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let pool = generate_balanced_pool(size, &mut rng);
            prop_assert_eq!(pool.len(), size);
            prop_assert!(pool.iter().filter(|&&c| is_vowel(c)).count() >= size * 3 / 10);
            prop_assert!(pool.iter().filter(|&&c| is_consonant(c)).count() >= size / 2);
        }
    }
}
