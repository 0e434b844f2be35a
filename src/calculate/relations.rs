//! Relation target mapping (assist / strong / weak).

use std::collections::{HashMap, HashSet};

use crate::models::{
    HeroId, HeroListRecord, HeroRankRecord, HeroRankRow, HeroRelationEntry, HeroRelationSet,
    RelationTarget, RelationTargetSet,
};

use super::names::NameMap;

/// Resolve one relation entry into `{id, name}` targets.
///
/// Ids are kept in their original order, invalid ids are skipped and
/// duplicates keep their first occurrence.
pub fn map_relation_targets(
    entry: Option<&HeroRelationEntry>,
    names: &NameMap,
) -> Vec<RelationTarget> {
    let Some(entry) = entry else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    entry
        .target_ids()
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let id = raw.to_hero_id()?;
            if !seen.insert(id) {
                return None;
            }
            let name = names
                .get(id)
                .or_else(|| entry.target_name(index))
                .map(str::to_string)
                .unwrap_or_else(|| id.placeholder_name());
            Some(RelationTarget { id, name })
        })
        .collect()
}

/// Resolve all three relation lists of a hero. `None` when the hero has no
/// relation data or every list comes out empty.
pub fn build_relation_target_set(
    relation: Option<&HeroRelationSet>,
    names: &NameMap,
) -> Option<RelationTargetSet> {
    let relation = relation?;
    let targets = RelationTargetSet {
        assist: map_relation_targets(relation.assist.as_ref(), names),
        strong: map_relation_targets(relation.strong.as_ref(), names),
        weak: map_relation_targets(relation.weak.as_ref(), names),
    };
    (!targets.is_empty()).then_some(targets)
}

/// Join each ranking record with the relations of the same hero from the
/// hero list. Later hero-list entries for the same id replace earlier ones.
pub fn attach_relations(
    rankings: Vec<HeroRankRecord>,
    heroes: &[HeroListRecord],
    names: &NameMap,
) -> Vec<HeroRankRow> {
    let relations: HashMap<HeroId, &HeroRelationSet> = heroes
        .iter()
        .filter_map(|hero| Some((hero.hero_id.to_hero_id()?, hero.relation.as_ref()?)))
        .collect();

    rankings
        .into_iter()
        .map(|record| {
            let relation = record
                .main_heroid
                .to_hero_id()
                .and_then(|id| relations.get(&id).copied());
            HeroRankRow {
                relation_targets: build_relation_target_set(relation, names),
                relation: relation.cloned(),
                record,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::names::resolve_hero_names;
    use crate::models::{HeroAvatar, RawHeroId};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn id(n: u64) -> HeroId {
        HeroId::new(n).unwrap()
    }

    fn target(n: u64, name: &str) -> RelationTarget {
        RelationTarget {
            id: id(n),
            name: name.to_string(),
        }
    }

    fn raw(n: u64) -> RawHeroId {
        RawHeroId::from(n)
    }

    fn entry(ids: Vec<RawHeroId>) -> HeroRelationEntry {
        HeroRelationEntry {
            target_hero_id: Some(ids),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let mut names = NameMap::new();
        names.register(id(5), None);
        names.register(id(3), Some("Gusion"));

        let entry = entry(vec![raw(5), raw(5), raw(3)]);
        let targets = map_relation_targets(Some(&entry), &names);

        assert_eq!(targets, vec![target(5, "Hero 5"), target(3, "Gusion")]);
    }

    #[test]
    fn test_empty_or_absent_entry() {
        let names = NameMap::new();
        assert!(map_relation_targets(None, &names).is_empty());
        assert!(map_relation_targets(Some(&entry(vec![])), &names).is_empty());
        assert!(map_relation_targets(Some(&HeroRelationEntry::default()), &names).is_empty());
    }

    #[test]
    fn test_output_never_longer_than_input_and_unique() {
        let names = NameMap::new();
        let raw: Vec<RawHeroId> = serde_json::from_value(json!([4, "4", 0, -1, "x", null, 8, 4.0, 8]))
            .unwrap();
        let input_len = raw.len();
        let targets = map_relation_targets(Some(&entry(raw)), &names);

        assert!(targets.len() <= input_len);
        let ids: Vec<u64> = targets.iter().map(|t| t.id.get()).collect();
        assert_eq!(ids, vec![4, 8]);
    }

    #[test]
    fn test_name_fallback_order() {
        let mut names = NameMap::new();
        names.register(id(1), Some("From Map"));

        let entry = HeroRelationEntry {
            desc: Some("Good with".to_string()),
            target_hero_id: Some(vec![raw(1), raw(2), raw(3)]),
            target_hero: Some(vec![
                Some(HeroAvatar::named("Embedded One")),
                Some(HeroAvatar::named("Embedded Two")),
            ]),
        };
        let targets = map_relation_targets(Some(&entry), &names);

        assert_eq!(
            targets,
            vec![
                target(1, "From Map"),
                target(2, "Embedded Two"),
                target(3, "Hero 3"),
            ]
        );
    }

    #[test]
    fn test_relation_set_none_when_all_empty() {
        let names = NameMap::new();
        assert!(build_relation_target_set(None, &names).is_none());

        let relation = HeroRelationSet {
            assist: Some(entry(vec![])),
            strong: None,
            weak: Some(entry(vec![raw(0)])),
        };
        assert!(build_relation_target_set(Some(&relation), &names).is_none());
    }

    #[test]
    fn test_relation_set_partial() {
        let names = NameMap::new();
        let relation = HeroRelationSet {
            assist: None,
            strong: Some(entry(vec![raw(7)])),
            weak: None,
        };
        let set = build_relation_target_set(Some(&relation), &names).unwrap();

        assert!(set.assist.is_empty());
        assert_eq!(set.strong, vec![target(7, "Hero 7")]);
        assert!(set.weak.is_empty());
    }

    #[test]
    fn test_attach_relations_joins_by_hero_id() {
        let heroes: Vec<HeroListRecord> = serde_json::from_value(json!([
            {
                "hero_id": 10,
                "hero": {"data": {"name": "Chou"}},
                "relation": {"assist": {"target_hero_id": [11]}}
            },
            {"hero_id": 11, "hero": {"data": {"name": "Angela"}}}
        ]))
        .unwrap();
        let rankings: Vec<HeroRankRecord> = serde_json::from_value(json!([
            {"main_heroid": 10, "main_hero_win_rate": 0.5},
            {"main_heroid": 11, "main_hero_win_rate": 0.5},
            {"main_heroid": 99}
        ]))
        .unwrap();

        let names = resolve_hero_names(&rankings, &heroes);
        let rows = attach_relations(rankings, &heroes, &names);

        assert_eq!(rows.len(), 3);
        let chou = rows[0].relation_targets.as_ref().unwrap();
        assert_eq!(chou.assist, vec![target(11, "Angela")]);
        assert!(rows[0].relation.is_some());
        assert!(rows[1].relation.is_none());
        assert!(rows[1].relation_targets.is_none());
        assert!(rows[2].relation_targets.is_none());
    }
}
