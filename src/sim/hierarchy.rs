//! Parent links and composed transforms
//!
//! Shapes reference their parent by index into the same list. Transforms are
//! composed root to leaf every query since poses change every tick.

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use super::shape::{Pose, Shape};
use crate::consts::{ANGLE_STEP, POSITION_STEP, SCALE_STEP};

/// Radius of the marker drawn for shapes with fewer than three vertices
pub const MARKER_RADIUS: f32 = 4.0;

/// Topmost ancestor of `index` (itself when it has no parent)
pub fn root(shapes: &[Shape], index: usize) -> usize {
    let mut current = index;
    for _ in 0..shapes.len() {
        match shapes[current].parent {
            Some(parent) if parent < shapes.len() => current = parent,
            _ => break,
        }
    }
    current
}

/// Chain from the root down to `index`
pub fn ancestry(shapes: &[Shape], index: usize) -> Vec<usize> {
    let mut chain = vec![index];
    let mut current = index;
    while let Some(parent) = shapes[current].parent {
        if parent >= shapes.len() || chain.len() > shapes.len() {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain.reverse();
    chain
}

/// First shape whose parent chain never reaches a root
pub fn find_cycle(shapes: &[Shape]) -> Option<usize> {
    (0..shapes.len()).find(|&start| {
        let mut current = start;
        for _ in 0..=shapes.len() {
            match shapes[current].parent {
                Some(parent) if parent < shapes.len() => current = parent,
                _ => return false,
            }
        }
        true
    })
}

/// Translate, then rotate, then scale
pub fn local_transform(pose: &Pose) -> Affine2 {
    Affine2::from_scale_angle_translation(
        pose.scale * SCALE_STEP,
        (pose.angle * ANGLE_STEP).to_radians(),
        pose.position,
    )
}

/// Placement of `index` in arena pixels relative to the arena center
///
/// Each pose in the chain is blended `fraction` of the way back to its
/// previous tick.
pub fn world_transform(shapes: &[Shape], index: usize, fraction: f32) -> Affine2 {
    ancestry(shapes, index).into_iter().fold(
        Affine2::from_scale(Vec2::splat(POSITION_STEP)),
        |acc, i| acc * local_transform(&shapes[i].interpolated(fraction)),
    )
}

/// World-space geometry handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outline {
    /// One or two vertices: a round marker at the first vertex
    Marker { center: Vec2, radius: f32 },
    /// Closed polygon
    Polygon(Vec<Vec2>),
}

pub fn world_outline(shapes: &[Shape], index: usize, fraction: f32) -> Option<Outline> {
    let shape = &shapes[index];
    let transform = world_transform(shapes, index, fraction);
    let local = |v: &[i8; 2]| Vec2::new(v[0] as f32, v[1] as f32);

    match shape.vertices.len() {
        0 => None,
        1 | 2 => Some(Outline::Marker {
            center: transform.transform_point2(local(&shape.vertices[0])),
            radius: MARKER_RADIUS * transform.matrix2.determinant().abs().sqrt(),
        }),
        _ => Some(Outline::Polygon(
            shape
                .vertices
                .iter()
                .map(|v| transform.transform_point2(local(v)))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shape_with_parent(parent: Option<usize>) -> Shape {
        Shape {
            parent,
            ..Default::default()
        }
    }

    #[test]
    fn test_root_of_parentless_shape_is_itself() {
        let shapes = vec![shape_with_parent(None)];
        assert_eq!(root(&shapes, 0), 0);
        assert_eq!(ancestry(&shapes, 0), vec![0]);
    }

    #[test]
    fn test_root_follows_forward_and_backward_links() {
        // 0 -> 2 -> 1 (root)
        let shapes = vec![
            shape_with_parent(Some(2)),
            shape_with_parent(None),
            shape_with_parent(Some(1)),
        ];
        assert_eq!(root(&shapes, 0), 1);
        assert_eq!(ancestry(&shapes, 0), vec![1, 2, 0]);
        assert_eq!(find_cycle(&shapes), None);
    }

    #[test]
    fn test_root_terminates_on_cycle() {
        let shapes = vec![shape_with_parent(Some(1)), shape_with_parent(Some(0))];
        assert_eq!(find_cycle(&shapes), Some(0));
        // Bounded walk, whatever it lands on
        let _ = root(&shapes, 0);
        assert!(ancestry(&shapes, 0).len() <= shapes.len() + 1);
    }

    #[test]
    fn test_world_transform_composes_parent_first() {
        let mut parent = Shape::default();
        parent.pose.position = Vec2::new(10.0, 0.0);
        parent.pose.angle = 18.0; // 90 degrees
        parent.pose.scale = Vec2::splat(10.0); // 1.0x
        let mut child = shape_with_parent(Some(0));
        child.pose.position = Vec2::new(2.0, 0.0);
        child.pose.scale = Vec2::new(20.0, 10.0);
        parent.snapshot();
        child.snapshot();
        let shapes = vec![parent, child];

        let t = world_transform(&shapes, 1, 0.0);
        // Child origin: parent at (10,0), child offset (2,0) rotated 90 degrees
        // -> (10,2), times 8 px
        let origin = t.transform_point2(Vec2::ZERO);
        assert!((origin - Vec2::new(80.0, 16.0)).length() < 1e-3);
        // Child local +x: scaled 2x, rotated by the parent
        let x_axis = t.transform_vector2(Vec2::X);
        assert!((x_axis - Vec2::new(0.0, 16.0)).length() < 1e-3);
    }

    #[test]
    fn test_outline_marker_and_polygon() {
        let mut marker = Shape::default();
        marker.pose.scale = Vec2::splat(10.0);
        marker.vertices = vec![[1, 2]];
        marker.snapshot();
        let mut poly = marker.clone();
        poly.vertices = vec![[0, 0], [1, 0], [0, 1]];
        let empty = Shape::default();
        let shapes = vec![marker, poly, empty];

        match world_outline(&shapes, 0, 0.0) {
            Some(Outline::Marker { center, radius }) => {
                assert!((center - Vec2::new(8.0, 16.0)).length() < 1e-4);
                assert!((radius - 32.0).abs() < 1e-3);
            }
            other => panic!("expected marker, got {:?}", other),
        }
        match world_outline(&shapes, 1, 0.0) {
            Some(Outline::Polygon(points)) => assert_eq!(points.len(), 3),
            other => panic!("expected polygon, got {:?}", other),
        }
        assert_eq!(world_outline(&shapes, 2, 0.0), None);
    }

    proptest! {
        #[test]
        fn prop_root_has_no_parent(
            parents in prop::collection::vec(any::<prop::sample::Index>(), 1..40),
        ) {
            // Each shape i > 0 may point at any earlier shape; shape 0 is a root
            let shapes: Vec<Shape> = parents
                .iter()
                .enumerate()
                .map(|(i, p)| shape_with_parent(if i == 0 { None } else { Some(p.index(i)) }))
                .collect();
            for i in 0..shapes.len() {
                let r = root(&shapes, i);
                prop_assert!(shapes[r].parent.is_none());
                prop_assert_eq!(ancestry(&shapes, i)[0], r);
            }
        }
    }
}
