use super::{Geodesic, Vector};

/// Scan every face for the one whose center is closest to `v`. Ties go to
/// the lower index. Linear in the face count; the reference for `find`.
pub fn naive_find(sphere: &Geodesic, v: Vector) -> usize {
    let mut best = 0;
    let mut best_dist_sq = f64::MAX;
    for (i, &center) in sphere.centers.iter().enumerate() {
        let dist_sq = center.dist_sq(v);
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = i;
        }
    }
    best
}

/// Locate the face of the finest level whose center is closest to `v`,
/// descending the refinement hierarchy instead of scanning.
///
/// Level 0 is scanned one hemisphere at a time: the first six dodecahedron
/// faces cover the north, the last six the south. Each later level starts
/// from the previous winner (refinement preserves parent indices) and needs
/// only one pass over its neighbors, except at the finest level where
/// passes repeat until stable to patch up descents that land beside a
/// pentagon. A single-level hierarchy degenerates to the naive scan.
pub fn find(spheres: &[Geodesic], v: Vector) -> usize {
    if spheres.len() == 1 {
        return naive_find(&spheres[0], v);
    }

    let base = &spheres[0];
    let (mut start, candidates) = if v.z >= 0.0 {
        (0, 0..6)
    } else {
        (11, 6..12)
    };
    let mut best_dist_sq = base.centers[start].dist_sq(v);
    for i in candidates {
        let dist_sq = base.centers[i].dist_sq(v);
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            start = i;
        }
    }

    for (level, sphere) in spheres.iter().enumerate().skip(1) {
        let last = level == spheres.len() - 1;
        loop {
            let mut next = start;
            for &n in sphere.neighbors(start) {
                let dist_sq = sphere.centers[n].dist_sq(v);
                if dist_sq < best_dist_sq {
                    best_dist_sq = dist_sq;
                    next = n;
                }
            }
            let moved = next != start;
            start = next;
            if !last || !moved {
                break;
            }
        }
    }

    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesic::{build_hierarchy, dodecahedron};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn check(spheres: &[Geodesic], v: Vector, want: usize, want_dist: f64) {
        let got = find(spheres, v);
        assert_eq!(
            got, want,
            "find({:?}) on {} levels returned {}",
            v,
            spheres.len(),
            got
        );
        let dist = spheres.last().unwrap().centers[got].dist_sq(v).sqrt();
        assert!(
            (dist - want_dist).abs() < 1e-3,
            "distance to face {} was {}, expected {}",
            got,
            dist,
            want_dist
        );
    }

    #[test]
    fn dodecahedron_poles_and_equator() {
        let spheres = vec![dodecahedron()];
        check(&spheres, Vector::new(0.0, 0.0, 1.0), 0, 0.0);
        check(&spheres, Vector::new(0.0, 0.0, -1.0), 11, 0.0);
        check(&spheres, Vector::new(1.0, 0.0, 0.0), 7, 0.546);
        check(&spheres, Vector::new(0.0, 1.0, 0.0), 1, 0.459);
        check(&spheres, Vector::new(-1.0, 0.0, 0.0), 5, 0.546);
        check(&spheres, Vector::new(0.0, -1.0, 0.0), 8, 0.459);
    }

    #[test]
    fn two_levels_poles_and_equator() {
        let spheres = build_hierarchy(1);
        check(&spheres, Vector::new(0.0, 0.0, 1.0), 0, 0.0);
        check(&spheres, Vector::new(0.0, 0.0, -1.0), 11, 0.0);
        check(&spheres, Vector::new(1.0, 0.0, 0.0), 25, 0.0);
        check(&spheres, Vector::new(0.0, 1.0, 0.0), 23, 0.312);
        check(&spheres, Vector::new(-1.0, 0.0, 0.0), 30, 0.0);
        check(&spheres, Vector::new(0.0, -1.0, 0.0), 28, 0.312);
        check(&spheres, Vector::new(0.64, 0.6, 0.48), 17, 0.171);
    }

    #[test]
    fn three_levels_poles_and_equator() {
        let spheres = build_hierarchy(2);
        check(&spheres, Vector::new(0.0, 0.0, 1.0), 0, 0.0);
        check(&spheres, Vector::new(0.0, 0.0, -1.0), 11, 0.0);
        check(&spheres, Vector::new(1.0, 0.0, 0.0), 25, 0.0);
        check(&spheres, Vector::new(0.0, 1.0, 0.0), 113, 0.0);
        check(&spheres, Vector::new(-1.0, 0.0, 0.0), 30, 0.0);
        check(&spheres, Vector::new(0.0, -1.0, 0.0), 90, 0.0);
        check(&spheres, Vector::new(0.64, 0.6, 0.48), 72, 0.119);
    }

    #[test]
    fn matches_naive_scan_on_random_directions() {
        let spheres = build_hierarchy(4);
        let finest = spheres.last().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..2000 {
            let v = Vector::new(
                rng.r#gen::<f64>() * 2.0 - 1.0,
                rng.r#gen::<f64>() * 2.0 - 1.0,
                rng.r#gen::<f64>() * 2.0 - 1.0,
            );
            if v.length_sq() < 1e-6 {
                continue;
            }
            let v = v.normalize();
            let fast = find(&spheres, v);
            let slow = naive_find(finest, v);
            let fast_dist = finest.centers[fast].dist_sq(v);
            let slow_dist = finest.centers[slow].dist_sq(v);
            assert!(
                fast_dist <= slow_dist + 1e-15,
                "hierarchical find chose face {} (dist² {}) but naive found {} (dist² {})",
                fast,
                fast_dist,
                slow,
                slow_dist
            );
        }
    }

    #[test]
    fn every_cell_center_finds_itself() {
        let spheres = build_hierarchy(3);
        let finest = spheres.last().unwrap();
        for (i, &center) in finest.centers.iter().enumerate() {
            assert_eq!(
                find(&spheres, center),
                i,
                "center of face {} resolved elsewhere",
                i
            );
        }
    }
}
