//! The deterministic domain-generation algorithm (§4.2): a pure function
//! from `(params, index)` to a domain name, with an offset-resumable batch
//! helper on top for the worker handler in `domainflow-workers`.

use domainflow_core::{Error, PatternType, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub pattern_type: PatternType,
    pub variable_length: u32,
    pub character_set: Vec<char>,
    pub constant_string: String,
    pub tld: String,
}

impl GenerationParams {
    fn base(&self) -> i64 {
        self.character_set.len() as i64
    }

    /// Total length of the variable portion's mixed-radix numeral: one
    /// `variable_length`-digit segment for prefix/suffix, two for
    /// `both_variable` (variable1 and variable2 each get their own
    /// `variable_length` digits), zero for `constant_only`.
    fn variable_digit_count(&self) -> u32 {
        match self.pattern_type {
            PatternType::ConstantOnly => 0,
            PatternType::PrefixVariable | PatternType::SuffixVariable => self.variable_length,
            PatternType::BothVariable => self.variable_length * 2,
        }
    }
}

/// `|charset|^variable_length` (or the product for `both_variable`),
/// computed in checked 64-bit arithmetic; configurations that would
/// overflow are rejected at create-time, not silently truncated (§9).
pub fn total_possible_combinations(params: &GenerationParams) -> Result<i64> {
    if params.pattern_type != PatternType::ConstantOnly && params.character_set.is_empty() {
        return Err(Error::validation("character_set must be non-empty for a variable pattern"));
    }
    let digits = params.variable_digit_count();
    if digits == 0 {
        return Ok(1);
    }
    params
        .base()
        .checked_pow(digits)
        .ok_or_else(|| Error::validation("generator config overflows a signed 64-bit total"))
}

/// Decompose `index` into `length` mixed-radix digits over `base`,
/// most-significant digit first, so strictly ascending `index` yields
/// strictly ascending lexicographic-in-radix digit sequences.
fn decompose(index: i64, length: u32, base: i64) -> Vec<usize> {
    let mut digits = vec![0usize; length as usize];
    let mut remaining = index;
    for slot in digits.iter_mut().rev() {
        *slot = (remaining % base) as usize;
        remaining /= base;
    }
    digits
}

fn render(charset: &[char], digits: &[usize]) -> String {
    digits.iter().map(|&d| charset[d]).collect()
}

/// The pure generator function: `generate(params, index) -> domain_name`,
/// `index ∈ [0, total_possible_combinations)`.
pub fn generate(params: &GenerationParams, index: i64) -> Result<String> {
    let total = total_possible_combinations(params)?;
    if index < 0 || index >= total {
        return Err(Error::validation(format!(
            "index {index} out of range [0, {total})"
        )));
    }

    let base = params.base();
    let domain = match params.pattern_type {
        PatternType::ConstantOnly => format!("{}{}", params.constant_string, params.tld),
        PatternType::PrefixVariable => {
            let digits = decompose(index, params.variable_length, base);
            format!("{}{}{}", render(&params.character_set, &digits), params.constant_string, params.tld)
        }
        PatternType::SuffixVariable => {
            let digits = decompose(index, params.variable_length, base);
            format!("{}{}{}", params.constant_string, render(&params.character_set, &digits), params.tld)
        }
        PatternType::BothVariable => {
            let total_digits = params.variable_length * 2;
            let digits = decompose(index, total_digits, base);
            let (first, second) = digits.split_at(params.variable_length as usize);
            format!(
                "{}{}{}{}",
                render(&params.character_set, first),
                params.constant_string,
                render(&params.character_set, second),
                params.tld
            )
        }
    };
    Ok(domain)
}

/// One emitted domain paired with the offset that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedEntry {
    pub offset: i64,
    pub domain_name: String,
}

/// Draw up to `count` consecutive indices starting at `start_offset`,
/// clamped to `total_possible_combinations`. Returns the emitted entries;
/// the caller persists them and `start_offset + entries.len()` as the new
/// `current_offset` in the same transaction (§4.2).
pub fn generate_batch(
    params: &GenerationParams,
    start_offset: i64,
    count: i64,
) -> Result<Vec<GeneratedEntry>> {
    let total = total_possible_combinations(params)?;
    if start_offset < 0 || start_offset > total {
        return Err(Error::validation(format!(
            "start_offset {start_offset} out of range [0, {total}]"
        )));
    }
    let end = (start_offset + count).min(total);
    (start_offset..end)
        .map(|index| generate(params, index).map(|domain_name| GeneratedEntry { offset: index, domain_name }))
        .collect()
}

/// A stable (cross-run) hash of the fields that define a generation
/// config's shape, used as the key into `Generator Config State` so two
/// campaigns sharing a config coordinate a shared offset (§4.2). Uses a
/// hand-rolled FNV-1a over a canonical field encoding rather than
/// `std::hash::DefaultHasher`, whose algorithm is explicitly unspecified
/// across Rust versions and is documented as unsuitable for persisted keys.
pub fn config_hash(params: &GenerationParams) -> String {
    let mut buf = String::new();
    buf.push_str(match params.pattern_type {
        PatternType::PrefixVariable => "prefix_variable",
        PatternType::SuffixVariable => "suffix_variable",
        PatternType::BothVariable => "both_variable",
        PatternType::ConstantOnly => "constant_only",
    });
    buf.push('\0');
    buf.push_str(&params.variable_length.to_string());
    buf.push('\0');
    buf.extend(params.character_set.iter());
    buf.push('\0');
    buf.push_str(&params.constant_string);
    buf.push('\0');
    buf.push_str(&params.tld);

    format!("{:016x}", fnv1a_64(buf.as_bytes()))
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab_params() -> GenerationParams {
        GenerationParams {
            pattern_type: PatternType::PrefixVariable,
            variable_length: 2,
            character_set: vec!['a', 'b'],
            constant_string: ".x".into(),
            tld: ".com".into(),
        }
    }

    #[test]
    fn constant_only_smoke() {
        let params = GenerationParams {
            pattern_type: PatternType::ConstantOnly,
            variable_length: 0,
            character_set: vec![],
            constant_string: "hello".into(),
            tld: ".com".into(),
        };
        assert_eq!(total_possible_combinations(&params).unwrap(), 1);
        assert_eq!(generate(&params, 0).unwrap(), "hello.com");
    }

    #[test]
    fn variable_enumeration_matches_scenario_2() {
        let params = ab_params();
        assert_eq!(total_possible_combinations(&params).unwrap(), 4);
        let expected = ["aa.x.com", "ab.x.com", "ba.x.com", "bb.x.com"];
        for (i, domain) in expected.iter().enumerate() {
            assert_eq!(&generate(&params, i as i64).unwrap(), domain);
        }
    }

    #[test]
    fn generate_batch_is_resumable() {
        let params = ab_params();
        let first = generate_batch(&params, 0, 2).unwrap();
        let second = generate_batch(&params, 2, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0].domain_name, "aa.x.com");
        assert_eq!(second.last().unwrap().domain_name, "bb.x.com");
    }

    #[test]
    fn generate_batch_clamps_to_total() {
        let params = ab_params();
        let batch = generate_batch(&params, 3, 10).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].offset, 3);
    }

    #[test]
    fn both_variable_splits_digits_across_two_segments() {
        let params = GenerationParams {
            pattern_type: PatternType::BothVariable,
            variable_length: 1,
            character_set: vec!['a', 'b'],
            constant_string: "-".into(),
            tld: ".com".into(),
        };
        assert_eq!(total_possible_combinations(&params).unwrap(), 4);
        assert_eq!(generate(&params, 0).unwrap(), "a-a.com");
        assert_eq!(generate(&params, 1).unwrap(), "a-b.com");
        assert_eq!(generate(&params, 2).unwrap(), "b-a.com");
        assert_eq!(generate(&params, 3).unwrap(), "b-b.com");
    }

    #[test]
    fn overflowing_config_is_rejected() {
        let params = GenerationParams {
            pattern_type: PatternType::PrefixVariable,
            variable_length: 64,
            character_set: ('a'..='z').collect(),
            constant_string: String::new(),
            tld: ".com".into(),
        };
        assert!(total_possible_combinations(&params).is_err());
    }

    #[test]
    fn config_hash_is_stable_and_sensitive_to_shape() {
        let a = ab_params();
        let mut b = ab_params();
        b.variable_length = 3;
        assert_eq!(config_hash(&a), config_hash(&a));
        assert_ne!(config_hash(&a), config_hash(&b));
    }

    proptest::proptest! {
        #[test]
        fn generate_is_deterministic_and_injective(i in 0i64..4, j in 0i64..4) {
            let params = ab_params();
            let a1 = generate(&params, i).unwrap();
            let a2 = generate(&params, i).unwrap();
            proptest::prop_assert_eq!(&a1, &a2);
            if i != j {
                let b = generate(&params, j).unwrap();
                proptest::prop_assert_ne!(a1, b);
            }
        }
    }
}
