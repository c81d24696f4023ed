//! Recursive-descent query parser
//!
//! Grammar:
//!
//! ```text
//! disjunction := conjunction (("or" | ws) conjunction)*
//! conjunction := condition+
//! condition   := '(' disjunction ')' | '-' condition | keyword operator value | name
//! ```
//!
//! Productions return `Ok(None)` for "nothing here" and backtrack by resetting
//! the cursor. The only hard failure is an unbalanced parenthesis, which
//! collapses the whole query to `False`; so does any input left unconsumed.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::colors::parse_color_word;
use super::dates::released_at_condition;
use crate::query::{
    parse_mana_cost, strip_inexact, CompareOp, Condition, ConditionRef, PredicateOp, Prop, Query,
    Rarity, Subset, Value,
};

/// Subsets visible to the parser, keyed by name
pub type SubsetsByName = HashMap<String, Arc<Subset>>;

/// Operator between keyword and value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Colon,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Operator {
    /// Match order; two-character operators come before their prefixes
    const TOKENS: [(&'static str, Operator); 7] = [
        (":", Operator::Colon),
        ("=", Operator::Eq),
        ("!=", Operator::Ne),
        ("<=", Operator::Le),
        (">=", Operator::Ge),
        ("<", Operator::Lt),
        (">", Operator::Gt),
    ];

    /// Comparison for this operator; `:` means whatever the keyword chooses
    pub fn to_compare(self, colon: CompareOp) -> CompareOp {
        match self {
            Operator::Colon => colon,
            Operator::Eq => CompareOp::Eq,
            Operator::Ne => CompareOp::Ne,
            Operator::Lt => CompareOp::Lt,
            Operator::Gt => CompareOp::Gt,
            Operator::Le => CompareOp::Le,
            Operator::Ge => CompareOp::Ge,
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, Operator::Colon | Operator::Eq)
    }
}

/// Unbalanced parentheses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Unbalanced;

type Production = Result<Option<ConditionRef>, Unbalanced>;

/// Parse a query string. Never fails: malformed input yields a query that
/// matches nothing.
pub fn parse_query(name_to_subset: &SubsetsByName, input: &str) -> Query {
    QueryParser::new(name_to_subset, input).parse()
}

/// Parse a decimal integer consisting only of an optional `-` and ASCII digits
pub fn string_to_int(s: &str) -> Option<i32> {
    let digits = s.strip_prefix('-').unwrap_or(s);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    s.parse().ok()
}

fn date_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]{4})(?:-([0-9]{2})(?:-([0-9]{2}))?)?").ok())
        .as_ref()
}

fn rarity_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:common|uncommon|rare|mythic|special|bonus|[curmsb])").ok()
    })
    .as_ref()
}

/// Single-use parser state
pub struct QueryParser<'a> {
    name_to_subset: &'a SubsetsByName,
    input: &'a str,
    /// Byte offset, always on a char boundary
    pos: usize,
    props: BTreeSet<Prop>,
}

impl<'a> QueryParser<'a> {
    pub fn new(name_to_subset: &'a SubsetsByName, input: &'a str) -> Self {
        Self {
            name_to_subset,
            input,
            pos: 0,
            props: BTreeSet::new(),
        }
    }

    pub fn parse(mut self) -> Query {
        let condition = match self.parse_disjunction() {
            Ok(_) if self.chars_left() => Condition::constant(false),
            Ok(Some(condition)) => condition,
            Ok(None) => Condition::constant(true),
            Err(Unbalanced) => Condition::constant(false),
        };

        Query::new(self.props, condition)
    }

    fn chars_left(&self) -> bool {
        self.pos < self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn is_boundary(&self) -> bool {
        matches!(self.peek(), None | Some(' ' | '\t' | ')'))
    }

    /// Register the property of a leaf and hand it back
    fn leaf(&mut self, condition: ConditionRef) -> ConditionRef {
        if let Some(prop) = condition.prop() {
            self.props.insert(prop);
        }
        condition
    }

    fn collapse(
        mut conditions: Vec<ConditionRef>,
        join: fn(Vec<ConditionRef>) -> ConditionRef,
    ) -> Option<ConditionRef> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(join(conditions)),
        }
    }

    fn parse_disjunction(&mut self) -> Production {
        let mut conditions = Vec::new();

        while let Some(c) = self.peek() {
            if c == ')' {
                break;
            }

            if self.is_boundary() {
                self.advance();
                continue;
            }

            if let Some(condition) = self.parse_conjunction()? {
                conditions.push(condition);
            }
        }

        Ok(Self::collapse(conditions, Condition::or))
    }

    fn parse_conjunction(&mut self) -> Production {
        let mut conditions = Vec::new();

        while let Some(c) = self.peek() {
            if c == ')' {
                break;
            }

            if self.is_boundary() {
                self.advance();
                continue;
            }

            let is_or = self
                .input
                .get(self.pos..self.pos + 2)
                .map_or(false, |s| s.eq_ignore_ascii_case("or"));

            if is_or {
                self.pos += 2;

                if self.is_boundary() {
                    break;
                }

                self.pos -= 2;
            }

            if let Some(condition) = self.parse_condition()? {
                conditions.push(condition);
            }
        }

        Ok(Self::collapse(conditions, Condition::and))
    }

    fn parse_condition(&mut self) -> Production {
        match self.peek() {
            Some('(') => {
                self.advance();
                let result = self.parse_disjunction()?;

                if self.peek() != Some(')') {
                    return Err(Unbalanced);
                }

                self.advance();
                Ok(result)
            }
            Some('-') => {
                self.advance();
                Ok(self.parse_condition()?.map(Condition::not))
            }
            _ => {
                let start = self.pos;

                if let Some((keyword, operator)) = self.parse_keyword_and_operator() {
                    if let Some(condition) = self.parse_keyword_condition(&keyword, operator) {
                        return Ok(Some(condition));
                    }

                    self.pos = start;
                }

                Ok(Some(self.parse_name_condition()))
            }
        }
    }

    /// Find `keyword operator` followed by a value; restores the cursor on failure
    fn parse_keyword_and_operator(&mut self) -> Option<(String, Operator)> {
        let start = self.pos;

        while !self.is_boundary() {
            for (token, operator) in Operator::TOKENS {
                if !self.input[self.pos..].starts_with(token) {
                    continue;
                }

                let keyword_end = self.pos;
                self.pos += token.len();

                if self.is_boundary() {
                    self.pos = start;
                    return None;
                }

                let keyword = self.input[start..keyword_end].to_lowercase();
                return Some((keyword, operator));
            }

            self.advance();
        }

        self.pos = start;
        None
    }

    fn parse_keyword_condition(&mut self, keyword: &str, operator: Operator) -> Option<ConditionRef> {
        match keyword {
            "color" | "c" => self.parse_color_condition(operator, CompareOp::Ge, Prop::Colors),
            "date" => self.parse_date_condition(operator),
            "format" | "f" => self.parse_format_condition(operator),
            "identity" | "id" => self.parse_color_condition(operator, CompareOp::Le, Prop::Identity),
            "is" => self.parse_boolean_condition(operator, true),
            "not" => self.parse_boolean_condition(operator, false),
            "mana" | "m" => self.parse_mana_cost_condition(operator),
            "manavalue" | "mv" | "cmc" => self.parse_mana_value_condition(operator),
            "oracle" | "o" => self.parse_substring_condition(operator, Prop::OracleSearch),
            "fulloracle" | "fo" => self.parse_substring_condition(operator, Prop::FullOracleSearch),
            "rarity" | "r" => self.parse_rarity_condition(operator),
            "set" | "s" | "edition" | "e" => self.parse_set_condition(operator),
            "subset" | "ss" => self.parse_subset_condition(operator),
            "type" | "t" => self.parse_substring_condition(operator, Prop::TypeSearch),
            "year" => self.parse_year_condition(operator),
            _ => None,
        }
    }

    /// Colors by pip count, color letters or a named combination
    fn parse_color_condition(
        &mut self,
        operator: Operator,
        colon: CompareOp,
        prop: Prop,
    ) -> Option<ConditionRef> {
        let word = self.parse_word();

        if let Some(count) = string_to_int(word) {
            let op = operator.to_compare(CompareOp::Eq);
            return Some(self.leaf(Condition::comparison(op, prop, Value::Int(count))));
        }

        let colors = parse_color_word(&word.to_lowercase())?;
        let op = operator.to_compare(colon);
        Some(self.leaf(Condition::comparison(op, prop, Value::Cost(colors))))
    }

    fn parse_date_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        let input = self.input;
        let captures = date_regex()?.captures(&input[self.pos..])?;
        let len = captures.get(0)?.end();

        let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
        let month = captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let day = captures.get(3).and_then(|d| d.as_str().parse::<u32>().ok());

        let condition = released_at_condition(operator.to_compare(CompareOp::Eq), year, month, day)?;
        self.pos += len;
        self.props.insert(Prop::ReleasedAt);
        Some(condition)
    }

    fn parse_format_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        if !operator.is_equality() {
            return None;
        }

        let word = self.parse_word().to_lowercase();
        let format = match word.as_str() {
            "edh" => "commander",
            "os" => "oldschool",
            "pd" => "penny",
            "pedh" => "paupercommander",
            "pm" => "premodern",
            "s" => "standard",
            other => other,
        };

        Some(self.leaf(Condition::comparison(
            CompareOp::Eq,
            Prop::Formats,
            Value::Str(format.to_string()),
        )))
    }

    /// `is:reprint` / `not:reprint`
    fn parse_boolean_condition(&mut self, operator: Operator, value: bool) -> Option<ConditionRef> {
        if !operator.is_equality() {
            return None;
        }

        match self.parse_word() {
            "reprint" => Some(self.leaf(Condition::comparison(
                CompareOp::Eq,
                Prop::Reprint,
                Value::Bool(value),
            ))),
            _ => None,
        }
    }

    fn parse_mana_cost_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        let (cost, len) = parse_mana_cost(self.input, self.pos);

        if cost.is_empty() {
            return None;
        }

        self.pos += len;
        let op = operator.to_compare(CompareOp::Ge);
        Some(self.leaf(Condition::comparison(op, Prop::Cost, Value::Cost(cost))))
    }

    fn parse_mana_value_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        let word = self.parse_word().to_lowercase();

        if operator.is_equality() {
            match word.as_str() {
                "even" => return Some(self.leaf(Condition::predicate(PredicateOp::Even, Prop::Cmc))),
                "odd" => return Some(self.leaf(Condition::predicate(PredicateOp::Odd, Prop::Cmc))),
                _ => {}
            }
        }

        let value = string_to_int(&word)?;
        let op = operator.to_compare(CompareOp::Eq);
        Some(self.leaf(Condition::comparison(op, Prop::Cmc, Value::Int(value))))
    }

    fn parse_substring_condition(&mut self, operator: Operator, prop: Prop) -> Option<ConditionRef> {
        if !operator.is_equality() {
            return None;
        }

        let (value, _) = self.parse_string();

        if value.is_empty() {
            return None;
        }

        Some(self.leaf(Condition::substring(prop, value.to_lowercase())))
    }

    fn parse_set_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        let code = self.parse_word().to_lowercase();
        let op = operator.to_compare(CompareOp::Eq);
        Some(self.leaf(Condition::comparison(op, Prop::Set, Value::Str(code))))
    }

    fn parse_subset_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        if !operator.is_equality() {
            return None;
        }

        let (name, _) = self.parse_string();

        if name.is_empty() {
            return None;
        }

        let subsets = self.name_to_subset;
        let subset = subsets.get(name)?;
        self.props.extend(subset.query.props.iter().copied());

        Some(Condition::subset(subset.id.clone()))
    }

    fn parse_rarity_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        let input = self.input;
        let start = self.pos;
        let matched = rarity_regex()?.find(&input[start..])?;

        self.pos += matched.end();

        if !self.is_boundary() {
            self.pos = start;
            return None;
        }

        let rarity = Rarity::parse(&matched.as_str().to_lowercase())?;
        let op = operator.to_compare(CompareOp::Eq);
        Some(self.leaf(Condition::comparison(op, Prop::Rarity, Value::Rarity(rarity))))
    }

    fn parse_year_condition(&mut self, operator: Operator) -> Option<ConditionRef> {
        let year = string_to_int(self.parse_word())?;
        let condition = released_at_condition(operator.to_compare(CompareOp::Eq), year, None, None)?;
        self.props.insert(Prop::ReleasedAt);
        Some(condition)
    }

    /// Bare words match names. Quoted text is an exact substring of the
    /// lower-cased full name; unquoted text is split on slashes and matched
    /// without punctuation or whitespace.
    fn parse_name_condition(&mut self) -> ConditionRef {
        let (value, quoted) = self.parse_string();
        let value = value.to_lowercase();

        if quoted {
            return self.leaf(Condition::substring(Prop::NameSearch, value));
        }

        let parts: Vec<ConditionRef> = value
            .split(|c| c == '/' || c == '\\')
            .map(strip_inexact)
            .filter(|part| !part.is_empty())
            .map(|part| self.leaf(Condition::substring(Prop::NameInexact, part)))
            .collect();

        Self::collapse(parts, Condition::and).unwrap_or_else(|| Condition::constant(true))
    }

    /// Quoted string if a closing quote exists, otherwise a word
    fn parse_string(&mut self) -> (&'a str, bool) {
        let input = self.input;

        if let Some(quote @ ('"' | '\'')) = self.peek() {
            let start = self.pos + 1;

            if let Some(len) = input[start..].find(quote) {
                self.pos = start + len + 1;
                return (&input[start..start + len], true);
            }
        }

        (self.parse_word(), false)
    }

    /// Everything up to the next boundary
    fn parse_word(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;

        while !self.is_boundary() {
            self.advance();
        }

        &input[start..self.pos]
    }
}
