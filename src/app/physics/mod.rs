mod forces;
mod quadtree;

use eframe::egui::Vec2;

use crate::report::MAX_SIMILARITY;

use super::{PhysicsConfig, RenderGraph};
use forces::{CollisionParams, accumulate_collisions, accumulate_repulsion};
use quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.72;
const COLLISION_REACH: f32 = 3.4;

/// Rest length of a similarity link: near-identical submissions sit close.
fn preferred_length(value: f32, radius_a: f32, radius_b: f32) -> f32 {
    let dissimilarity = (MAX_SIMILARITY - value.clamp(0.0, MAX_SIMILARITY)) / MAX_SIMILARITY;
    70.0 + dissimilarity * 160.0 + (radius_a + radius_b) * 3.0
}

/// One integration step of the force layout. Returns whether anything moved.
pub(super) fn step_physics(cache: &mut RenderGraph, config: PhysicsConfig) -> bool {
    let node_count = cache.nodes.len();
    if node_count < 2 {
        return false;
    }

    let scratch = &mut cache.physics_scratch;
    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();
    let mut max_radius = 0.0_f32;
    for node in &cache.nodes {
        scratch.positions.push(node.world_pos);
        scratch.radii.push(node.base_radius);
        max_radius = max_radius.max(node.base_radius);
    }

    let intensity = config.intensity.clamp(0.2, 2.5);
    let repulsion_strength = 60_000.0 * intensity * config.repulsion_scale.clamp(0.25, 2.6);
    let spring_strength = 0.02 * intensity * config.spring_scale.clamp(0.2, 2.2);
    let spring_damping = 0.22;
    let collision_strength = 1.6 * intensity * config.collision_scale.clamp(0.2, 2.0);
    let center_pull = 0.0012 * intensity;
    let group_pull = config.group_pull.clamp(0.0, 0.08) * intensity;
    let damping = (config.velocity_damping - (intensity * 0.015)).clamp(0.78, 0.97);
    let softening = 620.0;
    let time_step_scale = (config.delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping_factor = damping.powf(time_step_scale);

    let forces = &mut scratch.forces;
    let positions = &scratch.positions;
    let radii = &scratch.radii;

    if let Some(tree) = QuadNode::build(positions) {
        for (index, force) in forces.iter_mut().enumerate() {
            accumulate_repulsion(
                &tree,
                index,
                positions,
                repulsion_strength,
                softening,
                BARNES_HUT_THETA,
                force,
            );
        }

        let reach = max_radius * 2.0 * COLLISION_REACH;
        if reach > 0.0 {
            accumulate_collisions(
                &tree,
                &tree,
                true,
                positions,
                radii,
                CollisionParams {
                    strength: collision_strength,
                    reach: COLLISION_REACH,
                    max_distance_sq: reach * reach,
                },
                forces,
            );
        }
    }

    for edge in &cache.edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = positions[from] - positions[to];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;

        let preferred = preferred_length(edge.value, radii[from], radii[to]);
        let weight = 0.5 + edge.value.clamp(0.0, MAX_SIMILARITY) / MAX_SIMILARITY;
        let spring = (distance - preferred) * spring_strength * weight;
        let relative_velocity = cache.nodes[from].velocity - cache.nodes[to].velocity;
        let correction = direction * (spring + relative_velocity.dot(direction) * spring_damping);

        forces[from] -= correction;
        forces[to] += correction;
    }

    // Members of one group drift toward their shared centroid.
    let groups = &mut scratch.group_sums;
    groups.clear();
    if group_pull > 0.0 {
        for node in &cache.nodes {
            if let Some(group) = node.group {
                if groups.len() <= group {
                    groups.resize(group + 1, (Vec2::ZERO, 0));
                }
                groups[group].0 += node.world_pos;
                groups[group].1 += 1;
            }
        }
    }

    for (index, force) in forces.iter_mut().enumerate() {
        let position = positions[index];
        *force -= position * center_pull;
        if let Some(&(sum, count)) = cache.nodes[index].group.and_then(|group| groups.get(group))
            && count > 1
        {
            *force -= (position - sum / count as f32) * group_pull;
        }
    }

    let max_force = 165.0 + (intensity * 90.0);
    let max_speed = 11.0 + (intensity * 15.0);
    let mut any_motion = false;
    let mut average_velocity = Vec2::ZERO;
    for (node, force) in cache.nodes.iter_mut().zip(forces.iter()) {
        let mut force = *force;
        let force_length = force.length();
        if force_length > max_force {
            force *= max_force / force_length;
        }

        let mut velocity = (node.velocity + force * (0.055 * time_step_scale)) * damping_factor;
        let mut speed = velocity.length();
        if speed > max_speed {
            velocity *= max_speed / speed;
            speed = max_speed;
        }
        if speed < 0.02 && force_length < 0.08 {
            velocity = Vec2::ZERO;
            speed = 0.0;
        }

        node.velocity = velocity;
        node.world_pos += velocity * time_step_scale;
        average_velocity += velocity;
        any_motion |= speed > 0.001;
    }

    average_velocity /= node_count as f32;
    let centroid =
        cache.nodes.iter().fold(Vec2::ZERO, |sum, node| sum + node.world_pos) / node_count as f32;
    for node in &mut cache.nodes {
        node.velocity -= average_velocity;
        node.world_pos -= centroid;
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use super::preferred_length;

    #[test]
    fn similar_pairs_rest_closer() {
        let close = preferred_length(9.5, 8.0, 8.0);
        let far = preferred_length(1.0, 8.0, 8.0);
        assert!(close < far);
        assert_eq!(preferred_length(42.0, 0.0, 0.0), 70.0);
        assert_eq!(preferred_length(-1.0, 0.0, 0.0), 230.0);
    }
}
