pub mod find;
pub mod vector;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use find::{find, naive_find};
pub use vector::{Angle, Vector};

/// Edge ids keyed by the canonical (low, high) face pair. The id is the
/// sequence number in which the edge was first created; the chamfer of the
/// next level turns edge `e` into face `face_count + e`.
pub type EdgeMap = HashMap<(usize, usize), usize>;

/// Adjacency record for a single face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "Neighbors")]
    pub neighbors: Vec<usize>,
}

/// One level of the Goldberg tiling hierarchy.
///
/// `centers[i]` is the unit vector to the center of face `i`; `faces[i]`
/// lists its adjacent face indices (5 for the twelve pentagons, 6 for
/// everything else). The edge map is derived state and is not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geodesic {
    pub centers: Vec<Vector>,
    #[serde(rename = "nodes")]
    pub faces: Vec<Node>,
    #[serde(skip)]
    pub edges: EdgeMap,
}

const SIN_ATAN_HALF: f64 = 0.447213595;
const COS_ATAN_HALF: f64 = 0.894427191;

/// The dodecahedron's adjacency, in edge-creation order. Poles first, the
/// northern ring, the equatorial zig-zag, the southern ring, the south pole.
const DODECAHEDRON_LINKS: [(usize, usize); 30] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (0, 5),
    (1, 2),
    (2, 3),
    (3, 4),
    (4, 5),
    (5, 1),
    (1, 10),
    (1, 6),
    (2, 6),
    (2, 7),
    (3, 7),
    (3, 8),
    (4, 8),
    (4, 9),
    (5, 9),
    (5, 10),
    (6, 7),
    (7, 8),
    (8, 9),
    (9, 10),
    (10, 6),
    (11, 6),
    (11, 7),
    (11, 8),
    (11, 9),
    (11, 10),
];

impl Geodesic {
    /// Number of faces at this level.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of undirected edges at this level.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn neighbors(&self, face: usize) -> &[usize] {
        &self.faces[face].neighbors
    }

    /// Connect faces `i` and `j`, assigning the edge the next sequential id.
    /// Linking an already-linked pair is a no-op.
    pub fn link(&mut self, i: usize, j: usize) {
        let key = edge_key(i, j);
        if self.edges.contains_key(&key) {
            return;
        }
        self.faces[i].neighbors.push(j);
        self.faces[j].neighbors.push(i);
        let id = self.edges.len();
        self.edges.insert(key, id);
    }

    /// The id of the edge between `i` and `j`. Adjacent faces always share
    /// an edge; anything else is a caller bug.
    pub fn edge_id(&self, i: usize, j: usize) -> usize {
        match self.edges.get(&edge_key(i, j)) {
            Some(&id) => id,
            None => panic!("faces {i} and {j} share no edge"),
        }
    }

    /// Rebuild the edge map of a freshly deserialized level.
    ///
    /// Edge ids are assigned in chamfer-creation order, which plain
    /// neighbor lists do not carry, so the linking pass is replayed: the
    /// static link table for the dodecahedron, the chamfer's iteration
    /// pattern over `parent` for every later level.
    pub fn rebuild_edges(&mut self, parent: Option<&Geodesic>) {
        self.edges.clear();
        match parent {
            None => {
                for &(i, j) in &DODECAHEDRON_LINKS {
                    self.record_edge(i, j);
                }
            }
            Some(parent) => {
                let parent_faces = parent.face_count();
                for face in 0..parent_faces {
                    for &n1 in parent.neighbors(face) {
                        let id_ij = parent_faces + parent.edge_id(face, n1);
                        self.record_edge(face, id_ij);
                        for &n2 in parent.neighbors(face) {
                            if n1 == n2 {
                                continue;
                            }
                            if let Some(&e) = parent.edges.get(&edge_key(n1, n2)) {
                                self.record_edge(id_ij, parent_faces + e);
                            }
                        }
                    }
                }
            }
        }
    }

    fn record_edge(&mut self, i: usize, j: usize) {
        let key = edge_key(i, j);
        if !self.edges.contains_key(&key) {
            let id = self.edges.len();
            self.edges.insert(key, id);
        }
    }
}

fn edge_key(i: usize, j: usize) -> (usize, usize) {
    if i < j { (i, j) } else { (j, i) }
}

/// The 12-face seed of the hierarchy: face centers at the vertices of an
/// icosahedron, pentagons only.
pub fn dodecahedron() -> Geodesic {
    use std::f64::consts::PI;

    let mut centers = Vec::with_capacity(12);
    centers.push(Vector::new(0.0, 0.0, 1.0));
    for k in 0..5 {
        let a = 2.0 * k as f64 * PI / 5.0;
        centers.push(Vector::new(
            a.sin() * COS_ATAN_HALF,
            a.cos() * COS_ATAN_HALF,
            SIN_ATAN_HALF,
        ));
    }
    for k in 0..5 {
        let a = (2 * k + 1) as f64 * PI / 5.0;
        centers.push(Vector::new(
            a.sin() * COS_ATAN_HALF,
            a.cos() * COS_ATAN_HALF,
            -SIN_ATAN_HALF,
        ));
    }
    centers.push(Vector::new(0.0, 0.0, -1.0));

    let mut g = Geodesic {
        centers,
        faces: vec![Node::default(); 12],
        edges: EdgeMap::new(),
    };
    for &(i, j) in &DODECAHEDRON_LINKS {
        g.link(i, j);
    }
    g
}

/// Normalized midpoint of two unit vectors.
fn bisect(a: Vector, b: Vector) -> Vector {
    (a + b).normalize()
}

/// Produce the next Goldberg level by replacing every edge with a new
/// hexagonal face.
///
/// The first `F` faces keep their centers and indices; the face created
/// from edge `{i, j}` lands at index `F + edge_id(i, j)`, centered on the
/// normalized midpoint of the two parent centers. New faces are adjacent to
/// both parents and to the new faces of edges that closed a triangle with
/// theirs; the direct `i`–`j` adjacency is dropped.
pub fn chamfer(g: &Geodesic) -> Geodesic {
    let n_faces = g.face_count();
    let n_edges = g.edge_count();

    let mut result = Geodesic {
        centers: Vec::with_capacity(n_faces + n_edges),
        faces: vec![Node::default(); n_faces + n_edges],
        edges: EdgeMap::new(),
    };
    result.centers.extend_from_slice(&g.centers);
    result
        .centers
        .resize(n_faces + n_edges, Vector::ZERO);

    for face in 0..n_faces {
        for &n1 in g.neighbors(face) {
            let id_ij = n_faces + g.edge_id(face, n1);
            result.link(face, id_ij);
            result.centers[id_ij] = bisect(g.centers[face], g.centers[n1]);

            for &n2 in g.neighbors(face) {
                if n1 == n2 {
                    continue;
                }
                if let Some(&e) = g.edges.get(&edge_key(n1, n2)) {
                    // face, n1 and n2 were mutually adjacent, so their two
                    // new faces touch.
                    result.link(id_ij, n_faces + e);
                }
            }
        }
    }

    result
}

/// Faces at refinement level `size`: 10·4^size + 2.
pub fn face_count_at(size: usize) -> usize {
    10 * 4usize.pow(size as u32) + 2
}

/// Build levels 0..=size from scratch.
pub fn build_hierarchy(size: usize) -> Vec<Geodesic> {
    let mut spheres = Vec::with_capacity(size + 1);
    spheres.push(dodecahedron());
    for level in 1..=size {
        let next = chamfer(&spheres[level - 1]);
        debug!(level, faces = next.face_count(), "chamfered sphere");
        spheres.push(next);
    }
    spheres
}
