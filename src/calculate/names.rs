//! Hero name resolution.
//!
//! Names live in four places in the upstream payloads: the hero-list record
//! itself, the denormalized relation targets of a hero-list record, the main
//! hero of a rank record, and the sub heroes of a rank record. Each location
//! is a [`NameSource`] variant with its own adapter; [`NameMap`] merges them
//! with explicit names taking priority over placeholders.

use std::collections::HashMap;

use crate::models::{
    HeroId, HeroListRecord, HeroRankRecord, HeroRankSubHero, HeroRelationEntry,
};

/// A place a hero id (and maybe its name) can be read from.
#[derive(Debug, Clone, Copy)]
pub enum NameSource<'a> {
    ListHero(&'a HeroListRecord),
    RelationTarget {
        entry: &'a HeroRelationEntry,
        index: usize,
    },
    RankMain(&'a HeroRankRecord),
    SubHero(&'a HeroRankSubHero),
}

impl<'a> NameSource<'a> {
    pub fn hero_id(&self) -> Option<HeroId> {
        match self {
            NameSource::ListHero(hero) => hero.hero_id.to_hero_id(),
            NameSource::RelationTarget { entry, index } => {
                entry.target_ids().get(*index)?.to_hero_id()
            }
            NameSource::RankMain(record) => record.main_heroid.to_hero_id(),
            NameSource::SubHero(sub) => sub.heroid.to_hero_id(),
        }
    }

    /// Explicit, non-empty name carried by this source.
    pub fn name(&self) -> Option<&'a str> {
        match *self {
            NameSource::ListHero(hero) => hero.hero.as_ref()?.name(),
            NameSource::RelationTarget { entry, index } => entry.target_name(index),
            NameSource::RankMain(record) => record.main_hero_name(),
            NameSource::SubHero(sub) => sub.hero.as_ref()?.name(),
        }
    }
}

/// All name sources of a hero-list record: the hero, then its assist,
/// strong and weak targets.
pub fn list_sources(hero: &HeroListRecord) -> impl Iterator<Item = NameSource<'_>> {
    let targets = hero
        .relation
        .iter()
        .flat_map(|relation| relation.entries())
        .flatten()
        .flat_map(|entry| {
            (0..entry.target_ids().len()).map(move |index| NameSource::RelationTarget { entry, index })
        });

    std::iter::once(NameSource::ListHero(hero)).chain(targets)
}

/// All name sources of a rank record: the main hero, then its sub heroes.
pub fn rank_sources(record: &HeroRankRecord) -> impl Iterator<Item = NameSource<'_>> {
    std::iter::once(NameSource::RankMain(record))
        .chain(record.sub_heroes().iter().map(NameSource::SubHero))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedName {
    name: String,
    explicit: bool,
}

/// Hero id to display name.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    entries: HashMap<HeroId, ResolvedName>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one observation. An explicit name replaces a placeholder (or an
    /// earlier explicit name); a missing name only fills an empty slot.
    pub fn register(&mut self, id: HeroId, name: Option<&str>) {
        match name.filter(|name| !name.is_empty()) {
            Some(name) => {
                self.entries.insert(
                    id,
                    ResolvedName {
                        name: name.to_string(),
                        explicit: true,
                    },
                );
            }
            None => {
                self.entries.entry(id).or_insert_with(|| ResolvedName {
                    name: id.placeholder_name(),
                    explicit: false,
                });
            }
        }
    }

    pub fn register_source(&mut self, source: NameSource<'_>) {
        if let Some(id) = source.hero_id() {
            self.register(id, source.name());
        }
    }

    pub fn get(&self, id: HeroId) -> Option<&str> {
        self.entries.get(&id).map(|resolved| resolved.name.as_str())
    }

    /// Whether the name for `id` came from a record rather than a placeholder.
    pub fn is_explicit(&self, id: HeroId) -> bool {
        self.entries.get(&id).is_some_and(|resolved| resolved.explicit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HeroId, &str)> {
        self.entries
            .iter()
            .map(|(id, resolved)| (*id, resolved.name.as_str()))
    }
}

impl<'a> FromIterator<NameSource<'a>> for NameMap {
    fn from_iter<I: IntoIterator<Item = NameSource<'a>>>(iter: I) -> Self {
        let mut map = NameMap::new();
        for source in iter {
            map.register_source(source);
        }
        map
    }
}

/// Build the name map from hero-list records, then rank records.
pub fn resolve_hero_names(rankings: &[HeroRankRecord], heroes: &[HeroListRecord]) -> NameMap {
    heroes
        .iter()
        .flat_map(list_sources)
        .chain(rankings.iter().flat_map(rank_sources))
        .collect()
}
