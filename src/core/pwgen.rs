//! Random password generation honoring a resolved profile.
//!
//! Each class minimum is satisfied by construction: the required characters
//! are drawn per class, the remainder comes from the combined pool, and the
//! result is shuffled. The first-char rule is enforced by swapping a letter
//! to the front.

use crate::constants;
use crate::models::profile::ProfileSet;
use anyhow::{bail, Result};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";

/// Generate a password for the given profile set.
pub fn generate(set: &ProfileSet) -> Result<String> {
    let profile = &set.profile;
    let specials: Vec<char> = if set.special_chars.is_empty() {
        constants::DEFAULT_SPECIAL_CHARS.chars().collect()
    } else {
        set.special_chars.chars().collect()
    };

    if profile.length == 0 {
        bail!("profile length must be greater than zero");
    }
    let required = profile.upper + profile.lower + profile.digits + profile.specials;
    if required > profile.length {
        bail!(
            "profile character minimums ({}) exceed length {}",
            required,
            profile.length
        );
    }

    let upper: Vec<char> = UPPER.chars().collect();
    let lower: Vec<char> = LOWER.chars().collect();
    let digits: Vec<char> = DIGITS.chars().collect();
    let mut pool: Vec<char> = Vec::new();
    pool.extend(&upper);
    pool.extend(&lower);
    pool.extend(&digits);
    if profile.specials > 0 {
        pool.extend(&specials);
    }

    let needs_extra_letter =
        profile.first_is_char && profile.upper == 0 && profile.lower == 0;
    if needs_extra_letter && required == profile.length {
        bail!("profile requires a leading letter but reserves no room for one");
    }

    let mut chars: Vec<char> = Vec::with_capacity(profile.length);
    draw(&upper, profile.upper, &mut chars);
    draw(&lower, profile.lower, &mut chars);
    draw(&digits, profile.digits, &mut chars);
    draw(&specials, profile.specials, &mut chars);
    if needs_extra_letter {
        let letters: Vec<char> = upper.iter().chain(lower.iter()).copied().collect();
        draw(&letters, 1, &mut chars);
    }
    let fill = profile.length - chars.len();
    draw(&pool, fill, &mut chars);
    chars.shuffle(&mut OsRng);

    if profile.first_is_char && !chars[0].is_ascii_alphabetic() {
        // a letter exists by construction
        if let Some(pos) = chars.iter().position(char::is_ascii_alphabetic) {
            chars.swap(0, pos);
        }
    }
    Ok(chars.into_iter().collect())
}

fn draw(class: &[char], n: usize, out: &mut Vec<char>) {
    for _ in 0..n {
        out.push(class[OsRng.gen_range(0..class.len())]);
    }
}
