//! Bounded overlap relaxation.
//!
//! Each iteration measures the pairwise penetration of node boxes and pushes
//! every overlapping pair apart along Z by a fraction of its Z penetration.
//! Displacements are accumulated for the whole iteration before being
//! applied, so the result does not depend on pair visiting order.

use log::{debug, warn};

use archsnap_core::geometry::Point;

use super::NodePlacement;
use crate::config::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct RelaxationOutcome {
    pub(super) iterations: usize,
    pub(super) converged: bool,
    pub(super) residual_overlap: f32,
}

/// Penetration depth of two boxes: the smallest per-axis overlap.
fn penetration(a: &NodePlacement, b: &NodePlacement) -> Option<Point> {
    a.bounds().overlap(&b.bounds())
}

fn max_overlap(nodes: &[NodePlacement]) -> f32 {
    let mut worst = 0.0f32;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if let Some(depth) = penetration(a, b) {
                worst = worst.max(depth.x().min(depth.y()).min(depth.z()));
            }
        }
    }
    worst
}

fn step(nodes: &mut [NodePlacement], strength: f32) {
    let mut shifts = vec![0.0f32; nodes.len()];
    for i in 0..nodes.len() {
        for j in i + 1..nodes.len() {
            let Some(depth) = penetration(&nodes[i], &nodes[j]) else {
                continue;
            };
            let push = depth.z() * strength / 2.0;
            // Nodes arrive in identifier order, which decides exact ties.
            if nodes[i].center.z() <= nodes[j].center.z() {
                shifts[i] -= push;
                shifts[j] += push;
            } else {
                shifts[i] += push;
                shifts[j] -= push;
            }
        }
    }
    for (node, shift) in nodes.iter_mut().zip(shifts) {
        node.center = node.center.with_z(node.center.z() + shift);
    }
}

/// Relaxes `nodes` in place.
///
/// The overlap check runs before every iteration, so an overlap-free input
/// costs zero iterations. Reaching `max_layout_iterations` is an advisory,
/// logged as a warning and reported as not converged.
pub(super) fn relax(nodes: &mut [NodePlacement], config: &LayoutConfig) -> RelaxationOutcome {
    let cap = config.max_layout_iterations();
    let mut iterations = 0;
    loop {
        let residual = max_overlap(nodes);
        if residual < config.overlap_epsilon() {
            debug!(iterations, residual; "Relaxation converged");
            return RelaxationOutcome {
                iterations,
                converged: true,
                residual_overlap: residual,
            };
        }
        if iterations >= cap {
            warn!(iterations, residual; "Maximum layout iterations reached, keeping best-effort layout");
            return RelaxationOutcome {
                iterations,
                converged: false,
                residual_overlap: residual,
            };
        }
        step(nodes, config.relaxation_strength());
        iterations += 1;
    }
}

#[cfg(test)]
mod tests {
    use archsnap_core::{geometry::Size, identifier::Id};
    use proptest::prelude::*;

    use super::*;

    fn node(name: &str, z: f32) -> NodePlacement {
        NodePlacement::new(Id::new(name), 0, Point::new(0.0, 0.5, z), Size::uniform(1.0))
    }

    #[test]
    fn test_separated_nodes_take_zero_iterations() {
        let mut nodes = vec![node("rx_a", 0.0), node("rx_b", 3.0)];
        let outcome = relax(&mut nodes, &LayoutConfig::default());

        assert_eq!(outcome.iterations, 0);
        assert!(outcome.converged);
        assert_eq!(nodes[0].center().z(), 0.0);
        assert_eq!(nodes[1].center().z(), 3.0);
    }

    #[test]
    fn test_overlapping_pair_is_separated() {
        let mut nodes = vec![node("rx_c", 0.0), node("rx_d", 0.4)];
        let outcome = relax(&mut nodes, &LayoutConfig::default());

        assert!(outcome.converged);
        assert!(outcome.iterations > 0);
        assert!(outcome.residual_overlap < LayoutConfig::default().overlap_epsilon());
        assert!(nodes[0].center().z() < nodes[1].center().z());
    }

    #[test]
    fn test_coincident_nodes_split_by_order() {
        let mut nodes = vec![node("rx_e", 1.0), node("rx_f", 1.0)];
        relax(&mut nodes, &LayoutConfig::default());

        assert!(nodes[0].center().z() < nodes[1].center().z());
    }

    #[test]
    fn test_cap_is_advisory() {
        let config = LayoutConfig::default().with_max_layout_iterations(1);
        let mut nodes = vec![node("rx_g", 0.0), node("rx_h", 0.0), node("rx_i", 0.1)];
        let outcome = relax(&mut nodes, &config);

        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.converged);
        assert!(outcome.residual_overlap > 0.0);
    }

    fn check_iterations_bounded(offsets: Vec<f32>, cap: usize) -> Result<(), TestCaseError> {
        let config = LayoutConfig::default().with_max_layout_iterations(cap);
        let mut nodes: Vec<NodePlacement> = offsets
            .iter()
            .enumerate()
            .map(|(i, &z)| node(&format!("rx_p{i}"), z))
            .collect();
        let outcome = relax(&mut nodes, &config);

        prop_assert!(outcome.iterations <= cap);
        if outcome.converged {
            prop_assert!(max_overlap(&nodes) < config.overlap_epsilon());
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_iterations_bounded(
            offsets in prop::collection::vec(-3.0f32..3.0, 1..12),
            cap in 0usize..40,
        ) {
            check_iterations_bounded(offsets, cap)?;
        }
    }
}
