//! Query DSL parser
//!
//! Turns free text such as `m>rgw cmc<=4 t:elf` into a [`Query`]: an immutable
//! condition tree plus the properties it needs loaded.
//!
//! Keywords:
//!
//! | Keyword | Property | `:` means |
//! |---|---|---|
//! | `color`, `c` | colors | `>=` |
//! | `identity`, `id` | identity | `<=` |
//! | `mana`, `m` | cost | `>=` |
//! | `manavalue`, `mv`, `cmc` | cmc | `=` |
//! | `date`, `year` | released_at | `=` |
//! | `rarity`, `r` | rarity | `=` |
//! | `set`, `s`, `edition`, `e` | set | `=` |
//! | `format`, `f` | formats | `=` only |
//! | `oracle`, `o` / `fulloracle`, `fo` | oracle text | substring |
//! | `type`, `t` | type line | substring |
//! | `is`, `not` | reprint | `=` only |
//! | `subset`, `ss` | stored subset | by name |
//!
//! Parsing never fails. A keyword whose value doesn't parse is read as a name
//! instead; unbalanced parentheses or leftover input yield a query matching
//! nothing.
//!
//! [`Query`]: crate::query::Query

mod colors;
mod dates;
mod parser;

pub use colors::parse_color_word;
pub use dates::{date_millis, end_of_period, released_at_condition, start_of_period};
pub use parser::{parse_query, string_to_int, Operator, QueryParser, SubsetsByName};
