use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::collections::HashSet;
use trivia_game::{DailyChallenge, QuestionPool};

/// Resolve CLI seed tokens into concrete seeds, keeping first-seen order.
///
/// Accepts decimal integers (negative values use their magnitude), `0x` hex,
/// and the keyword `daily`, which expands to the seed of `today`'s challenge.
pub fn resolve_seed_inputs(
    tokens: &[String],
    today: NaiveDate,
    pool: &QuestionPool,
) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("daily") {
            DailyChallenge::for_date(today, pool).seed
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            match u64::from_str_radix(hex, 16) {
                Ok(value) => value,
                Err(_) => bail!("Unrecognized seed token: {token}"),
            }
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert(seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        bail!("No seeds given");
    }
    Ok(seeds)
}
