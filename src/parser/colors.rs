//! Color words accepted by `color:` and `identity:`

use crate::query::ManaCost;

/// Named color combinations, as WUBRG letters
fn alias_letters(word: &str) -> Option<&'static str> {
    let letters = match word {
        "colorless" | "c" => "",
        "white" => "w",
        "blue" => "u",
        "black" => "b",
        "red" => "r",
        "green" => "g",
        // Two colors
        "azorius" => "wu",
        "orzhov" | "silverquill" => "wb",
        "dimir" => "ub",
        "izzet" | "prismari" => "ur",
        "rakdos" => "br",
        "golgari" | "witherbloom" => "bg",
        "gruul" => "rg",
        "boros" | "lorehold" => "rw",
        "selesnya" => "gw",
        "simic" | "quandrix" => "gu",
        // Three colors
        "bant" => "gwu",
        "esper" => "wub",
        "grixis" => "ubr",
        "jund" => "brg",
        "naya" => "rgw",
        "abzan" => "wbg",
        "jeskai" => "urw",
        "sultai" => "bgu",
        "mardu" => "rwb",
        "temur" => "gur",
        // Four colors
        "artifice" => "wubr",
        "chaos" => "ubrg",
        "aggression" => "brgw",
        "altruism" => "rgwu",
        "growth" => "gwub",
        _ => return None,
    };
    Some(letters)
}

/// Resolve a lower-cased color word to a set of colors, each counted once.
///
/// Accepts named combinations or any non-empty string of `wubrg` letters.
pub fn parse_color_word(word: &str) -> Option<ManaCost> {
    let letters = match alias_letters(word) {
        Some(letters) => letters,
        None if word.is_empty() => return None,
        None => word,
    };

    let mut cost = ManaCost::new();

    for c in letters.chars() {
        let symbol = match c {
            'w' => "W",
            'u' => "U",
            'b' => "B",
            'r' => "R",
            'g' => "G",
            _ => return None,
        };

        if !cost.contains(symbol) {
            cost.add(symbol, 1);
        }
    }

    Some(cost)
}
