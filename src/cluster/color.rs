use std::f32::consts::PI;

use eframe::egui::Color32;

/// Cyclic "sinebow" interpolation; `t` and `t + 1` give the same color.
pub fn sinebow(t: f32) -> Color32 {
    let t = 0.5 - t.rem_euclid(1.0);
    let channel = |offset: f32| {
        let s = (PI * (t + offset)).sin();
        (255.0 * s * s).round().clamp(0.0, 255.0) as u8
    };
    Color32::from_rgb(channel(0.0), channel(1.0 / 3.0), channel(2.0 / 3.0))
}

/// Color of cluster `group` when `total_groups` clusters are on screen.
///
/// The same group id maps to a different color after re-clustering changes
/// `total_groups`, so callers recompute colors on every cutoff change.
pub fn color_for(group: usize, total_groups: usize) -> Color32 {
    sinebow(group as f32 / (total_groups as f32 + 1.0))
}

pub fn palette(total_groups: usize) -> Vec<Color32> {
    (0..total_groups)
        .map(|group| color_for(group, total_groups))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{color_for, palette, sinebow};

    #[test]
    fn colors_are_pure() {
        assert_eq!(color_for(3, 7), color_for(3, 7));
        assert_eq!(palette(4), palette(4));
    }

    #[test]
    fn interpolation_is_cyclic() {
        assert_eq!(sinebow(0.25), sinebow(1.25));
        assert_eq!(sinebow(0.0), sinebow(1.0));
    }

    #[test]
    fn total_group_count_shifts_colors() {
        assert_ne!(color_for(1, 2), color_for(1, 5));
    }

    #[test]
    fn adjacent_groups_differ() {
        let colors = palette(6);
        for pair in colors.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }
}
