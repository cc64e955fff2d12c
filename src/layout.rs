// 📐 Layout Engine - Deterministic 2-D placement by connection status
//
//   unconnected          connected contributors        connected      unconnected
//   contributors   |     (circle around center)    |   beneficiaries  beneficiaries
//   x = -600       |     x ∈ [-200, 200]           |   x = 600        x = 800
//
// Regions never overlap on the x axis. Lanes are spaced uniformly and centered
// on center_y. Within a region entities are ordered by id.

use crate::config::LayoutConfig;
use crate::resolver::{Category, EntityKind, ResolvedEntity};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

// ============================================================================
// REGION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    ConnectedContributors,
    UnconnectedContributors,
    ConnectedBeneficiaries,
    UnconnectedBeneficiaries,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::ConnectedContributors,
        Region::UnconnectedContributors,
        Region::ConnectedBeneficiaries,
        Region::UnconnectedBeneficiaries,
    ];

    pub fn of(entity: &ResolvedEntity) -> Self {
        match (entity.kind, entity.category) {
            (EntityKind::Contributor, Category::Connected) => Region::ConnectedContributors,
            (EntityKind::Contributor, Category::Unconnected) => Region::UnconnectedContributors,
            (EntityKind::Beneficiary, Category::Connected) => Region::ConnectedBeneficiaries,
            (EntityKind::Beneficiary, Category::Unconnected) => Region::UnconnectedBeneficiaries,
        }
    }
}

impl LayoutConfig {
    /// Inclusive x-interval a region's nodes occupy
    pub fn region_bounds(&self, region: Region) -> (f64, f64) {
        match region {
            Region::ConnectedContributors => {
                (self.center_x - self.radius, self.center_x + self.radius)
            }
            Region::UnconnectedContributors => {
                (self.unconnected_contributor_x, self.unconnected_contributor_x)
            }
            Region::ConnectedBeneficiaries => {
                (self.connected_beneficiary_x, self.connected_beneficiary_x)
            }
            Region::UnconnectedBeneficiaries => {
                (self.unconnected_beneficiary_x, self.unconnected_beneficiary_x)
            }
        }
    }
}

// ============================================================================
// PLACEMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: EntityKind,
    pub id: String,
    pub region: Region,
    pub x: f64,
    pub y: f64,
}

pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        LayoutEngine { config }
    }

    /// Place every entity in exactly one region
    ///
    /// Output is grouped by region (in `Region::ALL` order), ordered by id inside a region.
    pub fn place(&self, entities: &[ResolvedEntity]) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(entities.len());

        for region in Region::ALL {
            let mut members: Vec<&ResolvedEntity> =
                entities.iter().filter(|e| Region::of(e) == region).collect();
            members.sort_by(|a, b| a.id.cmp(&b.id));

            let count = members.len();
            for (index, entity) in members.into_iter().enumerate() {
                let (x, y) = match region {
                    Region::ConnectedContributors => self.on_circle(index, count),
                    _ => (self.config.region_bounds(region).0, self.in_lane(index, count)),
                };
                placements.push(Placement {
                    kind: entity.kind,
                    id: entity.id.clone(),
                    region,
                    x,
                    y,
                });
            }
        }

        placements
    }

    /// angle = index / count × full turn
    fn on_circle(&self, index: usize, count: usize) -> (f64, f64) {
        let angle = index as f64 / count as f64 * TAU;
        (
            self.config.center_x + self.config.radius * angle.cos(),
            self.config.center_y + self.config.radius * angle.sin(),
        )
    }

    /// Uniform spacing, centered on center_y
    fn in_lane(&self, index: usize, count: usize) -> f64 {
        let offset = index as f64 - (count as f64 - 1.0) / 2.0;
        self.config.center_y + offset * self.config.lane_spacing
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entity(id: &str, kind: EntityKind, connections: usize) -> ResolvedEntity {
        ResolvedEntity {
            id: id.to_string(),
            display_label: id.to_string(),
            kind,
            category: if connections > 0 {
                Category::Connected
            } else {
                Category::Unconnected
            },
            connection_count: connections,
        }
    }

    fn mixed_entities() -> Vec<ResolvedEntity> {
        vec![
            create_test_entity("c", EntityKind::Contributor, 2),
            create_test_entity("a", EntityKind::Contributor, 1),
            create_test_entity("b", EntityKind::Contributor, 3),
            create_test_entity("idle", EntityKind::Contributor, 0),
            create_test_entity("idle2", EntityKind::Contributor, 0),
            create_test_entity("dana", EntityKind::Beneficiary, 1),
            create_test_entity("noa", EntityKind::Beneficiary, 0),
            create_test_entity("ruth", EntityKind::Beneficiary, 0),
            create_test_entity("yael", EntityKind::Beneficiary, 0),
        ]
    }

    #[test]
    fn test_every_entity_placed_once() {
        let engine = LayoutEngine::default();
        let entities = mixed_entities();
        let placements = engine.place(&entities);

        assert_eq!(placements.len(), entities.len());
        for entity in &entities {
            let hits = placements
                .iter()
                .filter(|p| p.id == entity.id && p.kind == entity.kind)
                .count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_region_separation() {
        let config = LayoutConfig::default();
        let engine = LayoutEngine::new(config.clone());
        let placements = engine.place(&mixed_entities());

        for placement in &placements {
            let (low, high) = config.region_bounds(placement.region);
            assert!(
                placement.x >= low - 1e-9 && placement.x <= high + 1e-9,
                "{:?} outside {:?}",
                placement,
                (low, high)
            );
            for other in Region::ALL.iter().filter(|r| **r != placement.region) {
                let (other_low, other_high) = config.region_bounds(*other);
                assert!(placement.x < other_low || placement.x > other_high);
            }
        }
    }

    #[test]
    fn test_connected_contributors_on_circle() {
        let config = LayoutConfig::default();
        let engine = LayoutEngine::new(config.clone());
        let placements = engine.place(&mixed_entities());

        let circle: Vec<&Placement> = placements
            .iter()
            .filter(|p| p.region == Region::ConnectedContributors)
            .collect();
        assert_eq!(circle.len(), 3);

        // Ordered by id, first one at angle 0
        assert_eq!(circle[0].id, "a");
        assert!((circle[0].x - config.radius).abs() < 1e-9);
        assert!(circle[0].y.abs() < 1e-9);

        for placement in circle {
            let distance = (placement.x.powi(2) + placement.y.powi(2)).sqrt();
            assert!((distance - config.radius).abs() < 1e-9);
        }
    }

    #[test]
    fn test_lane_spacing_uniform_and_centered() {
        let engine = LayoutEngine::default();
        let placements = engine.place(&mixed_entities());

        let lane: Vec<f64> = placements
            .iter()
            .filter(|p| p.region == Region::UnconnectedBeneficiaries)
            .map(|p| p.y)
            .collect();

        assert_eq!(lane, vec![-40.0, 0.0, 40.0]);

        let pair: Vec<f64> = placements
            .iter()
            .filter(|p| p.region == Region::UnconnectedContributors)
            .map(|p| p.y)
            .collect();
        assert_eq!(pair, vec![-20.0, 20.0]);
    }

    #[test]
    fn test_single_node_lane_at_center() {
        let engine = LayoutEngine::default();
        let entities = vec![create_test_entity("dana", EntityKind::Beneficiary, 1)];
        let placements = engine.place(&entities);

        assert_eq!(placements[0].x, 600.0);
        assert_eq!(placements[0].y, 0.0);
    }

    #[test]
    fn test_place_is_deterministic_regardless_of_input_order() {
        let engine = LayoutEngine::default();
        let entities = mixed_entities();
        let mut reversed = entities.clone();
        reversed.reverse();

        assert_eq!(engine.place(&entities), engine.place(&reversed));
    }

    #[test]
    fn test_place_empty() {
        let engine = LayoutEngine::default();
        assert!(engine.place(&[]).is_empty());
    }
}
