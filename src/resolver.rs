// 🔗 Relationship Resolver - Join beneficiaries to contributors
//
// A beneficiary is connected iff its declared contributor name matches a
// contributor AND its resolved monthly support is > 0. A contributor is
// connected iff at least one connected beneficiary points at it.
//
// Entities are keyed by normalized name and kept in first-seen order, so the
// same tables always resolve to the same result.

use crate::matcher::{FuzzyMatcher, MatchTier};
use crate::normalizer::normalize;
use crate::records::{BeneficiaryRecord, ContributorRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

// ============================================================================
// RESOLVED ENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Contributor,
    Beneficiary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Connected,
    Unconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    /// Normalized name (identity)
    pub id: String,

    /// Raw name as last seen in the tables
    pub display_label: String,

    pub kind: EntityKind,

    pub category: Category,

    /// Distinct counterparts this entity is connected to
    pub connection_count: usize,
}

impl ResolvedEntity {
    fn new(id: String, display_label: &str, kind: EntityKind) -> Self {
        ResolvedEntity {
            id,
            display_label: display_label.trim().to_string(),
            kind,
            category: Category::Unconnected,
            connection_count: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.category == Category::Connected
    }
}

// ============================================================================
// RELATIONSHIP
// ============================================================================

/// One resolved, positive-support (contributor, beneficiary) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub contributor_id: String,
    pub beneficiary_id: String,

    /// Resolved monthly support (> 0)
    pub monthly_support: f64,

    /// Which matcher tier linked the declared name to the contributor
    pub match_tier: MatchTier,
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub contributors: Vec<ResolvedEntity>,
    pub beneficiaries: Vec<ResolvedEntity>,
    pub relationships: Vec<Relationship>,

    /// Records whose name normalized to nothing
    pub skipped: usize,
}

impl Resolution {
    pub fn connected_contributors(&self) -> usize {
        self.contributors.iter().filter(|e| e.is_connected()).count()
    }

    pub fn connected_beneficiaries(&self) -> usize {
        self.beneficiaries.iter().filter(|e| e.is_connected()).count()
    }
}

/// Keyed entity list preserving first-seen order; the last label seen wins
struct EntityTable {
    kind: EntityKind,
    entities: Vec<ResolvedEntity>,
    index: HashMap<String, usize>,
}

impl EntityTable {
    fn new(kind: EntityKind) -> Self {
        EntityTable {
            kind,
            entities: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the position of the entity, or `None` for an empty key
    fn upsert(&mut self, raw_name: &str) -> Option<usize> {
        let key = normalize(raw_name);
        if key.is_empty() {
            return None;
        }

        if let Some(&position) = self.index.get(&key) {
            self.entities[position].display_label = raw_name.trim().to_string();
            return Some(position);
        }

        let position = self.entities.len();
        self.index.insert(key.clone(), position);
        self.entities.push(ResolvedEntity::new(key, raw_name, self.kind));
        Some(position)
    }

    fn keys(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.id.as_str()).collect()
    }
}

// ============================================================================
// RELATIONSHIP RESOLVER
// ============================================================================

pub struct RelationshipResolver {
    matcher: FuzzyMatcher,
}

impl RelationshipResolver {
    pub fn new(matcher: FuzzyMatcher) -> Self {
        RelationshipResolver { matcher }
    }

    /// Resolve who supports whom
    ///
    /// `contributors` holds the rows of every ledger that can name a contributor
    /// (primary first, then secondary). Never fails: empty tables give empty results.
    pub fn resolve(
        &self,
        contributors: &[ContributorRecord],
        beneficiaries: &[BeneficiaryRecord],
    ) -> Resolution {
        let mut skipped = 0;

        let mut contributor_table = EntityTable::new(EntityKind::Contributor);
        for record in contributors {
            if contributor_table.upsert(&record.name).is_none() {
                skipped += 1;
            }
        }
        let candidates = contributor_table.keys();

        let mut beneficiary_table = EntityTable::new(EntityKind::Beneficiary);
        // (contributor position, beneficiary position) → relationship position
        let mut pairs: HashMap<(usize, usize), usize> = HashMap::new();
        let mut relationships: Vec<(usize, usize, f64, MatchTier)> = Vec::new();

        for record in beneficiaries {
            let Some(beneficiary) = beneficiary_table.upsert(&record.name) else {
                skipped += 1;
                continue;
            };

            let support = record.resolved_support();
            let matched = record
                .declared_contributor
                .as_deref()
                .and_then(|declared| self.matcher.find(declared, &candidates));

            let Some(found) = matched else {
                continue;
            };

            if support <= 0.0 {
                debug!(
                    beneficiary = %record.name,
                    contributor = found.candidate,
                    "name matched but support is zero, left unconnected"
                );
                continue;
            }

            // A repeated row for the same pair updates the support instead of adding an edge
            match pairs.get(&(found.index, beneficiary)) {
                Some(&position) => {
                    relationships[position].2 = support;
                    relationships[position].3 = found.tier;
                }
                None => {
                    pairs.insert((found.index, beneficiary), relationships.len());
                    relationships.push((found.index, beneficiary, support, found.tier));
                }
            }
        }

        let mut contributors_out = contributor_table.entities;
        let mut beneficiaries_out = beneficiary_table.entities;

        // Pairs are unique, so counting pairs counts distinct counterparts
        for &(contributor, beneficiary, _, _) in &relationships {
            contributors_out[contributor].connection_count += 1;
            beneficiaries_out[beneficiary].connection_count += 1;
        }

        for entity in contributors_out.iter_mut().chain(beneficiaries_out.iter_mut()) {
            entity.category = if entity.connection_count > 0 {
                Category::Connected
            } else {
                Category::Unconnected
            };
        }

        let relationships = relationships
            .into_iter()
            .map(|(contributor, beneficiary, monthly_support, match_tier)| Relationship {
                contributor_id: contributors_out[contributor].id.clone(),
                beneficiary_id: beneficiaries_out[beneficiary].id.clone(),
                monthly_support,
                match_tier,
            })
            .collect();

        let resolution = Resolution {
            contributors: contributors_out,
            beneficiaries: beneficiaries_out,
            relationships,
            skipped,
        };

        info!(
            contributors = resolution.contributors.len(),
            connected_contributors = resolution.connected_contributors(),
            beneficiaries = resolution.beneficiaries.len(),
            connected_beneficiaries = resolution.connected_beneficiaries(),
            relationships = resolution.relationships.len(),
            skipped,
            "relationships resolved"
        );

        resolution
    }
}

impl Default for RelationshipResolver {
    fn default() -> Self {
        Self::new(FuzzyMatcher::new())
    }
}

// ============================================================================
// TESTS
// ============================================================================
