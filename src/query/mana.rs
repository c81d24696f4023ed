//! Mana costs and the mana-cost mini-grammar
//!
//! A cost maps canonical symbol keys to counts. Keys:
//!
//! - single symbols: `W` `U` `B` `R` `G` `C` `X` `S`
//! - `N`: specific generic cost, counted by its numeric value
//! - hybrids in a fixed order: `W/U` `W/B` `U/B` `U/R` `B/R` `B/G` `R/G` `R/W`
//!   `G/W` `G/U`, monocolored `2/W`, colorless `C/W`
//! - phyrexian variants carry a trailing `/P`: `U/P`, `G/W/P`
//!
//! Hybrid keys are normalized regardless of the order symbols were written in,
//! so `{u/w}` and `{W/U}` produce the same key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const MANA_WHITE: &str = "W";
pub const MANA_BLUE: &str = "U";
pub const MANA_BLACK: &str = "B";
pub const MANA_RED: &str = "R";
pub const MANA_GREEN: &str = "G";
pub const MANA_COLORLESS: &str = "C";
/// Specific generic cost
pub const MANA_GENERIC: &str = "N";
/// Generic cost of "X"
pub const MANA_GENERIC_X: &str = "X";
pub const MANA_SNOW: &str = "S";
pub const MANA_PHYREXIAN: &str = "P";

pub const MANA_WUBRG: [&str; 5] = [MANA_WHITE, MANA_BLUE, MANA_BLACK, MANA_RED, MANA_GREEN];

/// Canonical mana cost.
///
/// Backed by an ordered map so iteration (and therefore the query hash) does
/// not depend on the order symbols were written in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManaCost(BTreeMap<String, u32>);

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete cost string, ignoring anything after the last symbol
    pub fn parse(input: &str) -> Self {
        parse_mana_cost(input, 0).0
    }

    /// Count of one symbol key, if present
    pub fn get(&self, symbol: &str) -> Option<u32> {
        self.0.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains_key(symbol)
    }

    /// Number of distinct symbol keys
    pub fn symbol_count(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Add `amount` to a symbol's count, creating it if needed
    pub fn add(&mut self, symbol: impl Into<String>, amount: u32) {
        let count = self.0.entry(symbol.into()).or_insert(0);
        *count = count.saturating_add(amount);
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ManaCost {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut cost = ManaCost::new();
        for (symbol, amount) in iter {
            cost.add(symbol, amount);
        }
        cost
    }
}

/// Canonical text: one brace group per symbol, generic cost as one number.
///
/// Parsing the text yields an equal cost.
impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, count) in self.iter() {
            if symbol == MANA_GENERIC {
                write!(f, "{{{}}}", count)?;
            } else {
                for _ in 0..count {
                    write!(f, "{{{}}}", symbol)?;
                }
            }
        }
        Ok(())
    }
}

/// Match one symbol letter from `letters` or a run of ASCII digits at the
/// start of `input`, case-insensitively. Returns the matched length.
fn match_token(input: &str, letters: &[u8]) -> Option<usize> {
    let bytes = input.as_bytes();
    let first = *bytes.first()?;

    if first.is_ascii_digit() {
        return Some(bytes.iter().take_while(|b| b.is_ascii_digit()).count());
    }

    if letters.contains(&first.to_ascii_uppercase()) {
        return Some(1);
    }

    None
}

const SHORTHAND_LETTERS: &[u8] = b"WUBRGCXS";
const GROUP_LETTERS: &[u8] = b"WUBRGCXSP";

/// Parse as many mana symbols as possible starting at byte offset `start`.
///
/// Returns the cost and the number of bytes consumed. Never fails: an invalid
/// symbol simply ends the cost.
pub fn parse_mana_cost(input: &str, start: usize) -> (ManaCost, usize) {
    let mut pos = start;
    let mut cost = ManaCost::new();

    while let Some(symbol) = parse_mana_symbol(input, pos) {
        cost.add(symbol.key, symbol.generic.unwrap_or(1));
        pos += symbol.len;
    }

    (cost, pos - start)
}

struct ManaSymbol {
    key: String,
    /// Numeric value when the symbol is a specific generic cost
    generic: Option<u32>,
    len: usize,
}

/// A matched token is either a number (generic cost) or one symbol letter.
/// Numbers too large for `u32` are rejected.
fn classify(token: &str) -> Option<(String, Option<u32>)> {
    if token.as_bytes()[0].is_ascii_digit() {
        let value = token.parse::<u32>().ok()?;
        Some((MANA_GENERIC.to_string(), Some(value)))
    } else {
        Some((token.to_ascii_uppercase(), None))
    }
}

fn parse_mana_symbol(input: &str, start: usize) -> Option<ManaSymbol> {
    let rest = input.get(start..)?;

    if let Some(len) = match_token(rest, SHORTHAND_LETTERS) {
        let (key, generic) = classify(&rest[..len])?;
        return Some(ManaSymbol { key, generic, len });
    }

    if !rest.starts_with('{') {
        return None;
    }

    let mut pos = start + 1;
    // Insertion order matters for the colorless and monocolored hybrid forms.
    let mut symbols: Vec<(String, Option<u32>)> = Vec::with_capacity(3);

    loop {
        let len = match_token(&input[pos..], GROUP_LETTERS)?;
        let (key, generic) = classify(&input[pos..pos + len])?;
        pos += len;

        if symbols.iter().any(|(k, _)| *k == key) {
            return None;
        }

        symbols.push((key, generic));

        match input[pos..].chars().next() {
            Some('}') => {
                pos += 1;
                break;
            }
            Some('/') => {
                if symbols.len() >= 3 {
                    return None;
                }
                pos += 1;
            }
            _ => return None,
        }
    }

    let (key, generic) = normalize_group(&symbols)?;

    Some(ManaSymbol {
        key,
        generic,
        len: pos - start,
    })
}

/// Build the canonical key of one brace group
fn normalize_group(symbols: &[(String, Option<u32>)]) -> Option<(String, Option<u32>)> {
    let has = |s: &str| symbols.iter().any(|(k, _)| k == s);
    let others = |s: &str| symbols.iter().map(|(k, _)| k.as_str()).find(|k| *k != s);

    if let Some(generic) = symbols
        .iter()
        .find(|(k, _)| k == MANA_GENERIC)
        .and_then(|(_, g)| *g)
    {
        if generic == 2 && symbols.len() == 2 {
            let other = others(MANA_GENERIC)?;

            if !MANA_WUBRG.contains(&other) {
                return None;
            }

            return Some((format!("2/{}", other), None));
        }

        if symbols.len() != 1 {
            return None;
        }

        return Some((MANA_GENERIC.to_string(), Some(generic)));
    }

    for single in [MANA_GENERIC_X, MANA_SNOW] {
        if has(single) {
            if symbols.len() != 1 {
                return None;
            }
            return Some((single.to_string(), None));
        }
    }

    let phyrexian = has(MANA_PHYREXIAN);

    let max_symbols = if phyrexian { 3 } else { 2 };

    if symbols.len() > max_symbols {
        return None;
    }

    if has(MANA_COLORLESS) {
        if phyrexian {
            return None;
        }

        let key = match others(MANA_COLORLESS) {
            Some(other) => format!("C/{}", other),
            None => MANA_COLORLESS.to_string(),
        };
        return Some((key, None));
    }

    let (w, u, b, r, g) = (
        has(MANA_WHITE),
        has(MANA_BLUE),
        has(MANA_BLACK),
        has(MANA_RED),
        has(MANA_GREEN),
    );

    let base = if w {
        if u {
            "W/U"
        } else if b {
            "W/B"
        } else if r {
            "R/W"
        } else if g {
            "G/W"
        } else {
            "W"
        }
    } else if u {
        if b {
            "U/B"
        } else if r {
            "U/R"
        } else if g {
            "G/U"
        } else {
            "U"
        }
    } else if b {
        if r {
            "B/R"
        } else if g {
            "B/G"
        } else {
            "B"
        }
    } else if r {
        if g {
            "R/G"
        } else {
            "R"
        }
    } else if g {
        "G"
    } else {
        // A lone {P} names no color.
        return None;
    };

    let key = if phyrexian {
        format!("{}/{}", base, MANA_PHYREXIAN)
    } else {
        base.to_string()
    };

    Some((key, None))
}
