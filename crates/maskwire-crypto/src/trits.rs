//! Balanced-trinary scalars and fixed-width integer coding
//!
//! Everything on the wire is a balanced trit in `{-1, 0, 1}`. Three trits form
//! a tryte with a value in `-13..=13`, printed with the usual alphabet where
//! `'9'` is zero and `'A'..='Z'` are `1..=26` (values above 13 wrap negative).

/// A balanced trit. Valid values are `-1`, `0` and `1`.
pub type Trit = i8;

/// Number of trits in one tryte.
pub const TRITS_PER_TRYTE: usize = 3;

/// Addition modulo 3 in the balanced representation.
///
/// This is the trinary analogue of XOR and is its own family of inverses:
/// `sub(add(a, b), b) == a`.
#[inline]
pub fn add(a: Trit, b: Trit) -> Trit {
    ((a + b + 4) % 3) - 1
}

/// Subtraction modulo 3 in the balanced representation.
#[inline]
pub fn sub(a: Trit, b: Trit) -> Trit {
    add(a, -b)
}

/// Number of trits needed for `n` trytes.
#[inline]
pub const fn trits_in_trytes(n: usize) -> usize {
    n * TRITS_PER_TRYTE
}

/// Encode a fixed-width balanced integer, least significant trit first.
///
/// The value must fit the width: `|value| <= (3^width - 1) / 2`.
pub fn encode_int(value: i64, out: &mut [Trit]) {
    let mut v = value;
    for slot in out.iter_mut() {
        let r = v.rem_euclid(3);
        let d: Trit = if r == 2 { -1 } else { r as Trit };
        *slot = d;
        v = (v - i64::from(d)) / 3;
    }
    debug_assert_eq!(v, 0, "value does not fit the declared trit width");
}

/// Decode a fixed-width balanced integer written by [`encode_int`].
pub fn decode_int(trits: &[Trit]) -> i64 {
    trits.iter().rev().fold(0i64, |acc, &t| acc * 3 + i64::from(t))
}

/// Convert a tryte-alphabet string to trits (3 trits per character).
///
/// Returns `None` if the string contains a character outside `'9'`, `'A'..='Z'`.
pub fn trits_from_str(s: &str) -> Option<Vec<Trit>> {
    let mut out = Vec::with_capacity(trits_in_trytes(s.len()));
    for c in s.chars() {
        let value = tryte_value(c)?;
        let mut tryte = [0; TRITS_PER_TRYTE];
        encode_int(i64::from(value), &mut tryte);
        out.extend_from_slice(&tryte);
    }
    Some(out)
}

/// Convert trits back to a tryte-alphabet string.
///
/// Returns `None` if the length is not a multiple of three.
pub fn trits_to_string(trits: &[Trit]) -> Option<String> {
    if trits.len() % TRITS_PER_TRYTE != 0 {
        return None;
    }
    let mut out = String::with_capacity(trits.len() / TRITS_PER_TRYTE);
    for tryte in trits.chunks(TRITS_PER_TRYTE) {
        out.push(tryte_char(decode_int(tryte) as i8));
    }
    Some(out)
}

fn tryte_value(c: char) -> Option<i8> {
    let v = match c {
        '9' => 0,
        'A'..='Z' => (c as i8) - b'A' as i8 + 1,
        _ => return None,
    };
    Some(if v > 13 { v - 27 } else { v })
}

fn tryte_char(value: i8) -> char {
    debug_assert!((-13..=13).contains(&value));
    let u = value.rem_euclid(27) as u8;
    if u == 0 { '9' } else { (b'A' + u - 1) as char }
}
