//! Shared fixture: a small card catalog served from memory
//!
//! Records are in canonical (name) order. Every payload and sort index carries
//! the same creation time unless a test replaces them.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cardquery::catalog::{CardStore, Catalog, MemoryDataSource, PropertyPayload};
use cardquery::coordinator::{ExecutionSettings, QueryExecutor};
use cardquery::index::{SortIndexKind, SortIndexWriter};
use cardquery::parser::{date_millis, parse_query};
use cardquery::planner::simplify;
use cardquery::query::{Prop, Query, SubsetStore};
use serde_json::{json, Value};

pub const CREATION_TIME: u64 = 1_700_000_000_000;

/// (name, cmc, cost, type, formats, sets, rarities, release dates)
type Card = (
    &'static str,
    u32,
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
    &'static [&'static str],
    &'static [(i32, u32, u32)],
);

pub const CARDS: [Card; 9] = [
    (
        "Ancestral Vision",
        0,
        "",
        "Sorcery",
        &["legacy", "vintage", "modern"],
        &["tsp", "tsr"],
        &["rare", "special"],
        &[(2006, 9, 22), (2021, 3, 19)],
    ),
    (
        "Black Lotus",
        0,
        "{0}",
        "Artifact",
        &["vintage"],
        &["lea", "leb"],
        &["rare", "rare"],
        &[(1993, 8, 5), (1993, 10, 4)],
    ),
    (
        "Carpet of Flowers",
        1,
        "{G}",
        "Enchantment",
        &["legacy", "vintage"],
        &["usg"],
        &["uncommon"],
        &[(1998, 10, 12)],
    ),
    (
        "Everflowing Chalice",
        0,
        "{0}",
        "Artifact",
        &["legacy", "vintage", "modern"],
        &["wwk", "2xm"],
        &["uncommon", "uncommon"],
        &[(2010, 2, 5), (2020, 8, 7)],
    ),
    (
        "Evermind",
        0,
        "",
        "Instant — Arcane",
        &["legacy", "vintage", "modern"],
        &["sok"],
        &["uncommon"],
        &[(2005, 6, 3)],
    ),
    (
        "Forever Young",
        2,
        "{1}{B}",
        "Sorcery",
        &["legacy", "vintage", "modern", "premodern"],
        &["m21"],
        &["common"],
        &[(2020, 7, 3)],
    ),
    (
        "Magic Carpet",
        3,
        "{3}",
        "Artifact",
        &["legacy", "vintage", "premodern"],
        &["uds"],
        &["uncommon"],
        &[(1999, 6, 7)],
    ),
    (
        "Mana Matrix",
        6,
        "{6}",
        "Artifact",
        &["legacy", "vintage", "premodern"],
        &["mir"],
        &["rare"],
        &[(1996, 10, 8)],
    ),
    (
        "Mox Sapphire",
        0,
        "{0}",
        "Artifact",
        &["vintage"],
        &["lea", "leb"],
        &["rare", "rare"],
        &[(1993, 8, 5), (1993, 10, 4)],
    ),
];

pub fn card_names() -> Vec<&'static str> {
    CARDS.iter().map(|card| card.0).collect()
}

pub fn payload(creation_time: u64, data: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({ "creation_time": creation_time, "data": data }))
        .expect("payload serializes")
}

fn release_millis(card: &Card) -> Vec<i64> {
    card.7
        .iter()
        .map(|&(y, m, d)| date_millis(y, m, d).expect("valid fixture date"))
        .collect()
}

fn release_strings(card: &Card) -> Vec<String> {
    card.7
        .iter()
        .map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d))
        .collect()
}

fn column(f: impl Fn(&Card) -> Value) -> Value {
    Value::Array(CARDS.iter().map(f).collect())
}

/// Stored property columns of the fixture
pub fn columns() -> Vec<(Prop, Value)> {
    vec![
        (Prop::Name, column(|c| json!([c.0]))),
        (Prop::Cmc, column(|c| json!(c.1))),
        (Prop::Cost, column(|c| json!([c.2]))),
        (Prop::Type, column(|c| json!([c.3]))),
        (Prop::Formats, column(|c| json!(c.4))),
        (Prop::Set, column(|c| json!(c.5))),
        (Prop::Rarity, column(|c| json!(c.6))),
        (Prop::ReleasedAt, column(|c| json!(release_strings(c)))),
    ]
}

/// Every fixture column decoded into a catalog
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    for (prop, data) in columns() {
        catalog.insert(prop, data).expect("fixture column decodes");
    }
    catalog
}

/// Every payload and sort index of the fixture as `(file name, contents)`
pub fn files(creation_time: u64) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = columns()
        .into_iter()
        .map(|(prop, data)| (PropertyPayload::file_name(prop), payload(creation_time, data)))
        .collect();

    let mut cmc = SortIndexWriter::new("cmc", SortIndexKind::ByRecord, creation_time);
    let mut released = SortIndexWriter::new("released_at", SortIndexKind::ByVersion, creation_time);

    for (record, card) in CARDS.iter().enumerate() {
        cmc.push(i64::from(card.1), record as u16, 0);

        for (version, millis) in release_millis(card).into_iter().enumerate() {
            released.push(millis, record as u16, version as u16);
        }
    }

    files.push(("card_cmc.sort".to_string(), cmc.finish()));
    files.push(("card_released_at.sort".to_string(), released.finish()));
    files
}

/// Insert every fixture file into a source, replacing what is there
pub fn populate(source: &MemoryDataSource, creation_time: u64) {
    for (name, contents) in files(creation_time) {
        source.insert(name, contents);
    }
}

pub fn fixture_source() -> Rc<MemoryDataSource> {
    let source = MemoryDataSource::new();
    populate(&source, CREATION_TIME);
    Rc::new(source)
}

pub struct Fixture {
    pub source: Rc<MemoryDataSource>,
    pub executor: QueryExecutor,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(ExecutionSettings::default())
    }

    pub fn with_settings(settings: ExecutionSettings) -> Self {
        Self::build(fixture_source(), Duration::from_secs(60), settings)
    }

    pub fn build(
        source: Rc<MemoryDataSource>,
        refetch_interval: Duration,
        settings: ExecutionSettings,
    ) -> Self {
        let store = CardStore::new(source.clone(), refetch_interval);
        let executor = QueryExecutor::new(store, Rc::new(RefCell::new(SubsetStore::new())), settings);
        Self { source, executor }
    }

    /// Define a named subset from query text
    pub fn define_subset(&self, name: &str, text: &str) {
        let subsets = self.executor.subsets();
        let mut subsets = subsets.borrow_mut();
        let parsed = parse_query(subsets.name_to_subset(), text);
        let query = simplify(subsets.id_to_subset(), &parsed);
        subsets.create_named(name, query).expect("subset name is free");
    }

    /// Parse and simplify query text against the fixture's subsets
    pub fn query(&self, text: &str) -> Query {
        let subsets = self.executor.subsets();
        let subsets = subsets.borrow();
        let parsed = parse_query(subsets.name_to_subset(), text);
        simplify(subsets.id_to_subset(), &parsed)
    }

    /// Names matching query text, in name order
    pub async fn names(&self, text: &str) -> Vec<String> {
        let query = self.query(text);
        let result = self
            .executor
            .execute(&query, Default::default(), true)
            .await
            .expect("query executes");
        result.names.clone()
    }
}
