// 🕸️ Graph Assembler - Resolve → weigh → place → snapshot
//
// One call = one full pass over the tables it is given. Nothing is cached and
// nothing escapes: any failure turns into an empty snapshot plus a logged error.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::layout::{LayoutEngine, Region};
use crate::matcher::FuzzyMatcher;
use crate::normalizer::normalize;
use crate::records::{BeneficiaryRecord, ContributorRecord};
use crate::resolver::{Category, EntityKind, RelationshipResolver, ResolvedEntity};
use crate::weights::{edge_label, latest_contribution, AmountTier, WeightCalculator};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::{error, info};

// ============================================================================
// SNAPSHOT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Render id: "donor_{key}" / "widow_{key}"
    pub node_id: String,

    #[serde(flatten)]
    pub entity: ResolvedEntity,

    pub region: Region,
    pub size: f64,
    pub color: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Render id of the contributor node
    pub source_id: String,

    /// Render id of the beneficiary node
    pub target_id: String,

    pub width: f64,
    pub tier: AmountTier,
    pub color: String,

    /// "{k}k {currency} ({date})"
    pub label: String,

    /// Amount of the contributor's most recent contribution
    pub amount: f64,

    pub as_of_date: Option<NaiveDate>,

    /// Beneficiary's resolved monthly support
    pub monthly_support: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,

    /// Number of rendered connections
    pub connection_count: usize,

    /// Rows dropped while loading or because their name normalized to nothing
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub contributors: usize,
    pub connected_contributors: usize,
    pub beneficiaries: usize,
    pub connected_beneficiaries: usize,
    pub connection_count: usize,
    pub total_monthly_support: f64,
    pub skipped_rows: usize,
}

impl GraphSnapshot {
    /// Zero entities, zero edges, zero connections
    pub fn empty() -> Self {
        GraphSnapshot::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, node_id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    pub fn nodes_in(&self, region: Region) -> impl Iterator<Item = &GraphNode> + '_ {
        self.nodes.iter().filter(move |n| n.region == region)
    }

    /// Builder pattern: fold in rows rejected while loading the tables
    pub fn with_load_skips(mut self, rejected_rows: usize) -> Self {
        self.skipped_rows += rejected_rows;
        self
    }

    pub fn summary(&self) -> GraphSummary {
        let count = |kind: EntityKind, connected_only: bool| {
            self.nodes
                .iter()
                .filter(|n| n.entity.kind == kind)
                .filter(|n| !connected_only || n.entity.is_connected())
                .count()
        };

        GraphSummary {
            contributors: count(EntityKind::Contributor, false),
            connected_contributors: count(EntityKind::Contributor, true),
            beneficiaries: count(EntityKind::Beneficiary, false),
            connected_beneficiaries: count(EntityKind::Beneficiary, true),
            connection_count: self.connection_count,
            total_monthly_support: self.edges.iter().map(|e| e.monthly_support).sum(),
            skipped_rows: self.skipped_rows,
        }
    }

    /// SHA-256 over the serialized snapshot; equal inputs give equal fingerprints
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        // Serializing plain structs of strings and numbers cannot fail
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(bytes);
        }
        format!("{:x}", hasher.finalize())
    }
}

impl GraphSummary {
    pub fn describe(&self) -> String {
        format!(
            "{} connections: {}/{} contributors and {}/{} beneficiaries connected, {:.0} monthly support, {} rows skipped",
            self.connection_count,
            self.connected_contributors,
            self.contributors,
            self.connected_beneficiaries,
            self.beneficiaries,
            self.total_monthly_support,
            self.skipped_rows
        )
    }
}

pub fn node_id(kind: EntityKind, key: &str) -> String {
    match kind {
        EntityKind::Contributor => format!("donor_{}", key),
        EntityKind::Beneficiary => format!("widow_{}", key),
    }
}

// ============================================================================
// GRAPH ASSEMBLER
// ============================================================================

pub struct GraphAssembler {
    config: EngineConfig,
}

impl GraphAssembler {
    pub fn new(config: EngineConfig) -> Self {
        GraphAssembler { config }
    }

    /// Build the snapshot; never fails
    ///
    /// `contributors` holds every ledger that can name a contributor.
    pub fn build(
        &self,
        contributors: &[ContributorRecord],
        beneficiaries: &[BeneficiaryRecord],
    ) -> GraphSnapshot {
        match self.try_build(contributors, beneficiaries) {
            Ok(snapshot) => {
                info!(
                    nodes = snapshot.nodes.len(),
                    edges = snapshot.edges.len(),
                    skipped = snapshot.skipped_rows,
                    fingerprint = %snapshot.fingerprint(),
                    "network graph built"
                );
                snapshot
            }
            Err(e) => {
                error!(error = %e, "network graph build failed, returning empty snapshot");
                GraphSnapshot::empty()
            }
        }
    }

    pub fn try_build(
        &self,
        contributors: &[ContributorRecord],
        beneficiaries: &[BeneficiaryRecord],
    ) -> Result<GraphSnapshot> {
        self.config.validate()?;

        let resolver = RelationshipResolver::new(FuzzyMatcher::from_config(&self.config.matching));
        let weights = WeightCalculator::from_config(&self.config.weights);
        let layout = LayoutEngine::new(self.config.layout.clone());

        let resolution = resolver.resolve(contributors, beneficiaries);

        // Latest contribution per contributor key, in one pass
        let mut by_contributor: HashMap<String, Vec<&ContributorRecord>> = HashMap::new();
        for record in contributors {
            let key = normalize(&record.name);
            if !key.is_empty() {
                by_contributor.entry(key).or_default().push(record);
            }
        }

        let entities: Vec<ResolvedEntity> = resolution
            .contributors
            .iter()
            .chain(&resolution.beneficiaries)
            .cloned()
            .collect();

        let lookup: HashMap<(EntityKind, &str), &ResolvedEntity> = entities
            .iter()
            .map(|e| ((e.kind, e.id.as_str()), e))
            .collect();

        let mut nodes = Vec::with_capacity(entities.len());
        for placement in layout.place(&entities) {
            let entity = lookup
                .get(&(placement.kind, placement.id.as_str()))
                .ok_or_else(|| Error::Internal(format!("placed unknown entity {}", placement.id)))?;

            let (size, color) = self.node_style(entity, &weights);
            if !(placement.x.is_finite() && placement.y.is_finite()) {
                return Err(Error::Internal(format!("non-finite position for {}", placement.id)));
            }

            nodes.push(GraphNode {
                node_id: node_id(entity.kind, &entity.id),
                entity: (*entity).clone(),
                region: placement.region,
                size,
                color,
                x: placement.x,
                y: placement.y,
            });
        }

        let known: HashSet<&str> = nodes.iter().map(|n| n.node_id.as_str()).collect();
        let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
        let mut edges = Vec::with_capacity(resolution.relationships.len());

        for relationship in &resolution.relationships {
            let source_id = node_id(EntityKind::Contributor, &relationship.contributor_id);
            let target_id = node_id(EntityKind::Beneficiary, &relationship.beneficiary_id);

            if !known.contains(source_id.as_str()) || !known.contains(target_id.as_str()) {
                return Err(Error::Internal(format!(
                    "edge {} → {} references a missing node",
                    source_id, target_id
                )));
            }
            if !seen_pairs.insert((source_id.clone(), target_id.clone())) {
                continue;
            }

            let latest = by_contributor
                .get(&relationship.contributor_id)
                .and_then(|records| latest_contribution(records.iter().copied()))
                .ok_or_else(|| {
                    Error::Internal(format!(
                        "contributor {} has no contribution records",
                        relationship.contributor_id
                    ))
                })?;

            let weight = weights.edge_weight(latest.amount);
            edges.push(GraphEdge {
                source_id,
                target_id,
                width: weight.width,
                tier: weight.tier,
                color: weight.tier.color(&self.config.palette).to_string(),
                label: edge_label(latest.amount, latest.date, &self.config.labels)?,
                amount: latest.amount,
                as_of_date: latest.date,
                monthly_support: relationship.monthly_support,
            });
        }

        Ok(GraphSnapshot {
            connection_count: edges.len(),
            nodes,
            edges,
            skipped_rows: resolution.skipped,
        })
    }

    fn node_style(&self, entity: &ResolvedEntity, weights: &WeightCalculator) -> (f64, String) {
        let palette = &self.config.palette;
        let color = match (entity.kind, entity.category) {
            (EntityKind::Contributor, Category::Connected) => &palette.connected_contributor,
            (EntityKind::Contributor, Category::Unconnected) => &palette.unconnected_contributor,
            (EntityKind::Beneficiary, Category::Connected) => &palette.connected_beneficiary,
            (EntityKind::Beneficiary, Category::Unconnected) => &palette.unconnected_beneficiary,
        };
        let size = weights.node_size(entity.kind, entity.category, entity.connection_count);
        (size, color.clone())
    }
}

impl Default for GraphAssembler {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
