//! In-memory columnar catalog
//!
//! Each stored property is one column with one entry per record. Decoding a
//! payload also fills the columns derived from it (search forms of names,
//! oracle text and type lines), so a derived property is available exactly
//! when its source is.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::errors::{LoadError, LoadResult};
use super::provider::{CardDataProvider, Datum, Values};
use super::text::remove_parenthesized_text;
use crate::query::{strip_inexact, ManaCost, Prop, Rarity};

const SCRYFALL_URL: &str = "https://scryfall.com/";
const IMAGE_URL: &str = "https://cards.scryfall.io/normal/";

/// Body of a `card_<prop>.json` file
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyPayload {
    /// Snapshot creation time, epoch milliseconds
    pub creation_time: u64,
    pub data: serde_json::Value,
}

impl PropertyPayload {
    /// File name of the payload holding `prop`
    pub fn file_name(prop: Prop) -> String {
        format!("card_{}.json", prop)
    }
}

#[derive(Debug)]
enum Column {
    Numbers(Vec<Option<f64>>),
    Bools(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Texts(Vec<Option<Vec<String>>>),
    Cost(Vec<Option<ManaCost>>),
    Costs(Vec<Option<Vec<Option<ManaCost>>>>),
    Rarities(Vec<Option<Vec<Rarity>>>),
    Dates(Vec<Option<Vec<i64>>>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Numbers(c) => c.len(),
            Column::Bools(c) => c.len(),
            Column::Text(c) => c.len(),
            Column::Texts(c) => c.len(),
            Column::Cost(c) => c.len(),
            Column::Costs(c) => c.len(),
            Column::Rarities(c) => c.len(),
            Column::Dates(c) => c.len(),
        }
    }

    fn values(&self, idx: usize) -> Values<'_> {
        let values = match self {
            Column::Numbers(c) => c.get(idx).copied().flatten().map(|v| Values::One(Datum::Number(v))),
            Column::Bools(c) => c.get(idx).copied().flatten().map(|v| Values::One(Datum::Bool(v))),
            Column::Text(c) => c.get(idx).and_then(Option::as_deref).map(|v| Values::One(Datum::Text(v))),
            Column::Texts(c) => c.get(idx).and_then(Option::as_deref).map(Values::Texts),
            Column::Cost(c) => c.get(idx).and_then(Option::as_ref).map(|v| Values::One(Datum::Cost(v))),
            Column::Costs(c) => c.get(idx).and_then(Option::as_deref).map(Values::Costs),
            Column::Rarities(c) => c.get(idx).and_then(Option::as_deref).map(Values::Rarities),
            Column::Dates(c) => c.get(idx).and_then(Option::as_deref).map(Values::Dates),
        };
        values.unwrap_or(Values::Missing)
    }
}

/// Loaded property columns
#[derive(Debug, Default)]
pub struct Catalog {
    columns: HashMap<Prop, Column>,
    length: Option<usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, prop: Prop) -> bool {
        self.columns.contains_key(&prop)
    }

    /// Number of loaded columns, derived ones included
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Drop every column
    pub fn clear(&mut self) {
        self.columns.clear();
        self.length = None;
    }

    /// Decode the payload of a stored property and its derived columns
    pub fn insert(&mut self, prop: Prop, data: serde_json::Value) -> LoadResult<()> {
        if prop.source() != prop || prop == Prop::Reprint {
            return Err(LoadError::NotStored(prop));
        }

        let name = PropertyPayload::file_name(prop);
        let decode_error = |e: serde_json::Error| LoadError::Decode {
            name: name.clone(),
            message: e.to_string(),
        };

        let column = match prop {
            Prop::Cmc => Column::Numbers(decode(data).map_err(decode_error)?),
            Prop::Landscape => Column::Bools(decode(data).map_err(decode_error)?),
            Prop::Sfurl => Column::Text(decode(data).map_err(decode_error)?),
            Prop::Formats | Prop::Img | Prop::Set => {
                Column::Texts(decode(data).map_err(decode_error)?)
            }
            Prop::Identity => {
                let raw: Vec<Option<String>> = decode(data).map_err(decode_error)?;
                Column::Cost(
                    raw.into_iter()
                        .map(|cost| cost.map(|s| ManaCost::parse(&s)))
                        .collect(),
                )
            }
            Prop::Colors | Prop::Cost => {
                let raw: Vec<Option<Vec<Option<String>>>> = decode(data).map_err(decode_error)?;
                Column::Costs(
                    raw.into_iter()
                        .map(|faces| faces.map(|faces| decode_face_costs(prop, faces)))
                        .collect(),
                )
            }
            Prop::Rarity => Column::Rarities(decode(data).map_err(decode_error)?),
            Prop::ReleasedAt => {
                let raw: Vec<Option<Vec<String>>> = decode(data).map_err(decode_error)?;
                let mut dates = Vec::with_capacity(raw.len());

                for versions in raw {
                    dates.push(match versions {
                        Some(versions) => Some(
                            versions
                                .iter()
                                .map(|v| parse_release_date(v))
                                .collect::<Option<Vec<_>>>()
                                .ok_or_else(|| LoadError::Decode {
                                    name: name.clone(),
                                    message: format!("invalid release dates {:?}", versions),
                                })?,
                        ),
                        None => None,
                    });
                }

                Column::Dates(dates)
            }
            Prop::Name => {
                let faces: Vec<Option<Vec<String>>> = decode(data).map_err(decode_error)?;
                self.set_column(
                    Prop::NameSearch,
                    Column::Text(derive_column(&faces, |f| f.join(" // ").to_lowercase())),
                );
                self.set_column(
                    Prop::NameInexact,
                    Column::Text(derive_column(&faces, |f| strip_inexact(&f.join("")).to_lowercase())),
                );
                Column::Texts(faces)
            }
            Prop::FullOracle => {
                let faces: Vec<Option<Vec<String>>> = decode(data).map_err(decode_error)?;
                let oracle = derive_column(&faces, |f| {
                    f.iter().map(|t| remove_parenthesized_text(t)).collect::<Vec<_>>()
                });
                let oracle_search = derive_lowercase(&oracle);
                self.set_column(Prop::FullOracleSearch, Column::Texts(derive_lowercase(&faces)));
                self.set_column(Prop::OracleSearch, Column::Texts(oracle_search));
                self.set_column(Prop::Oracle, Column::Texts(oracle));
                Column::Texts(faces)
            }
            Prop::Type => {
                let faces: Vec<Option<Vec<String>>> = decode(data).map_err(decode_error)?;
                self.set_column(Prop::TypeSearch, Column::Texts(derive_lowercase(&faces)));
                Column::Texts(faces)
            }
            other => return Err(LoadError::NotStored(other)),
        };

        self.set_column(prop, column);
        Ok(())
    }

    fn set_column(&mut self, prop: Prop, column: Column) {
        self.length = Some(column.len());
        self.columns.insert(prop, column);
    }

    /// Link to the record's page on Scryfall
    pub fn scryfall_url(&self, idx: usize) -> Option<String> {
        match self.get(idx, Prop::Sfurl) {
            Values::One(Datum::Text(path)) => Some(format!("{}{}", SCRYFALL_URL, path)),
            _ => None,
        }
    }

    /// Image of the record's front face
    pub fn image_url(&self, idx: usize) -> Option<String> {
        match self.get(idx, Prop::Img) {
            Values::Texts([first, ..]) => Some(format!("{}{}", IMAGE_URL, first)),
            _ => None,
        }
    }
}

impl CardDataProvider for Catalog {
    fn length(&self) -> Option<usize> {
        self.length
    }

    fn version_count(&self, idx: usize) -> Option<usize> {
        Prop::PER_VERSION
            .iter()
            .filter_map(|prop| self.columns.get(prop))
            .map(|column| column.values(idx))
            .find(|values| values.is_list())
            .map(|values| values.len())
    }

    fn get(&self, idx: usize, prop: Prop) -> Values<'_> {
        self.columns
            .get(&prop)
            .map_or(Values::Missing, |column| column.values(idx))
    }

    fn name(&self, idx: usize) -> Option<String> {
        match self.get(idx, Prop::Name) {
            Values::Texts(faces) if !faces.is_empty() => Some(faces.join(" // ")),
            _ => None,
        }
    }
}

fn decode<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(data)
}

/// Empty costs on back faces mean "no cost", not "costs nothing"
fn decode_face_costs(prop: Prop, faces: Vec<Option<String>>) -> Vec<Option<ManaCost>> {
    faces
        .into_iter()
        .enumerate()
        .map(|(i, face)| match face {
            Some(s) if i >= 1 && prop == Prop::Cost && s.is_empty() => None,
            Some(s) => Some(ManaCost::parse(&s)),
            None => None,
        })
        .collect()
}

fn derive_column<T>(faces: &[Option<Vec<String>>], f: impl Fn(&[String]) -> T) -> Vec<Option<T>> {
    faces.iter().map(|v| v.as_deref().map(&f)).collect()
}

fn derive_lowercase(faces: &[Option<Vec<String>>]) -> Vec<Option<Vec<String>>> {
    derive_column(faces, |f| f.iter().map(|t| t.to_lowercase()).collect())
}

/// `YYYY-MM-DD` at UTC midnight
fn parse_release_date(s: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp_millis())
}
