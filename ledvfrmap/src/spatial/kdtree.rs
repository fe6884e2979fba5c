//! k-d tree construction and search.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Number of coordinate axes.
const DIMENSIONS: usize = 2;

/// A tree node. Children are owned exclusively by their parent.
#[derive(Debug)]
struct Node<T> {
    /// Splitting axis (0 or 1), alternating by depth.
    axis: usize,
    /// Splitting value along `axis` (the node point's coordinate).
    split: f64,
    point: [f64; DIMENSIONS],
    payload: T,
    left: Option<Box<Node<T>>>,
    right: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn distance_to(&self, query: &[f64; DIMENSIONS]) -> f64 {
        euclidean(&self.point, query)
    }

    /// Children ordered (near, far) relative to the query.
    fn sides(&self, query: &[f64; DIMENSIONS]) -> (Option<&Node<T>>, Option<&Node<T>>) {
        if query[self.axis] < self.split {
            (self.left.as_deref(), self.right.as_deref())
        } else {
            (self.right.as_deref(), self.left.as_deref())
        }
    }

    /// Perpendicular distance from the query to this node's splitting plane.
    fn plane_distance(&self, query: &[f64; DIMENSIONS]) -> f64 {
        (query[self.axis] - self.split).abs()
    }
}

/// Pending work for the iterative search.
enum Step<'a, T> {
    /// Visit a node: score its point, then explore the near side.
    Visit(&'a Node<T>),
    /// After the near side is done, decide whether the far side can still win.
    CheckFar(&'a Node<T>),
}

/// A query result: distance and a reference to the matched payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a, T> {
    /// Euclidean distance from the query point.
    pub distance: f64,
    /// Coordinates of the matched point.
    pub point: [f64; DIMENSIONS],
    /// The matched payload.
    pub payload: &'a T,
}

/// Candidate ordered by distance, then by discovery order, for the k-best heap.
struct Candidate<'a, T> {
    distance: f64,
    order: usize,
    node: &'a Node<T>,
}

impl<T> PartialEq for Candidate<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Candidate<'_, T> {}

impl<T> PartialOrd for Candidate<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Candidate<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.order.cmp(&other.order))
    }
}

/// Balanced, immutable k-d tree over 2-D points with arbitrary payloads.
#[derive(Debug)]
pub struct SpatialIndex<T> {
    root: Option<Box<Node<T>>>,
    len: usize,
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<T> SpatialIndex<T> {
    /// Build a balanced tree from a snapshot of `(point, payload)` pairs.
    ///
    /// An empty input yields an empty index whose queries always report
    /// nothing. Construction sorts each subset along the current axis and
    /// splits at the median, O(n log² n) overall.
    pub fn build(points: Vec<([f64; DIMENSIONS], T)>) -> Self {
        let len = points.len();
        Self {
            root: build_subtree(points, 0),
            len,
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Find the point closest to `query`.
    ///
    /// Returns `(distance, payload)` or `None` for an empty index.
    pub fn nearest(&self, query: [f64; DIMENSIONS]) -> Option<(f64, &T)> {
        self.nearest_neighbor(query)
            .map(|found| (found.distance, found.payload))
    }

    /// Like [`nearest`](Self::nearest) but also reports the matched point.
    pub fn nearest_neighbor(&self, query: [f64; DIMENSIONS]) -> Option<Neighbor<'_, T>> {
        let root = self.root.as_deref()?;

        let mut best: Option<(f64, &Node<T>)> = None;
        let mut stack = vec![Step::Visit(root)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(node) => {
                    let distance = node.distance_to(&query);
                    if best.map_or(true, |(d, _)| distance < d) {
                        best = Some((distance, node));
                    }

                    let (near, _) = node.sides(&query);
                    stack.push(Step::CheckFar(node));
                    if let Some(near) = near {
                        stack.push(Step::Visit(near));
                    }
                }
                Step::CheckFar(node) => {
                    let (_, far) = node.sides(&query);
                    if let (Some(far), Some((best_distance, _))) = (far, best) {
                        if node.plane_distance(&query) <= best_distance {
                            stack.push(Step::Visit(far));
                        }
                    }
                }
            }
        }

        best.map(|(distance, node)| Neighbor {
            distance,
            point: node.point,
            payload: &node.payload,
        })
    }

    /// Find up to `k` points closest to `query`, nearest first.
    ///
    /// Equal distances are ordered by traversal order, matching the tie rule
    /// of [`nearest`](Self::nearest).
    pub fn k_nearest(&self, query: [f64; DIMENSIONS], k: usize) -> Vec<Neighbor<'_, T>> {
        let Some(root) = self.root.as_deref() else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let mut heap: BinaryHeap<Candidate<'_, T>> = BinaryHeap::with_capacity(k + 1);
        let mut order = 0usize;
        let mut stack = vec![Step::Visit(root)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(node) => {
                    let distance = node.distance_to(&query);
                    let worst = heap.peek().map(|c| c.distance);
                    if heap.len() < k || worst.is_some_and(|w| distance < w) {
                        heap.push(Candidate {
                            distance,
                            order,
                            node,
                        });
                        if heap.len() > k {
                            heap.pop();
                        }
                    }
                    order += 1;

                    let (near, _) = node.sides(&query);
                    stack.push(Step::CheckFar(node));
                    if let Some(near) = near {
                        stack.push(Step::Visit(near));
                    }
                }
                Step::CheckFar(node) => {
                    let (_, far) = node.sides(&query);
                    let Some(far) = far else { continue };
                    let bound = if heap.len() < k {
                        f64::INFINITY
                    } else {
                        heap.peek().map_or(f64::INFINITY, |c| c.distance)
                    };
                    if node.plane_distance(&query) <= bound {
                        stack.push(Step::Visit(far));
                    }
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                distance: c.distance,
                point: c.node.point,
                payload: &c.node.payload,
            })
            .collect()
    }

    /// Iterate over every indexed `(point, payload)` in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = ([f64; DIMENSIONS], &T)> {
        let mut stack: Vec<&Node<T>> = self.root.as_deref().into_iter().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.left.as_deref());
            stack.extend(node.right.as_deref());
            Some((node.point, &node.payload))
        })
    }

    /// Height of the tree (0 for an empty index).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(&Node<T>, usize)> =
            self.root.as_deref().map(|n| (n, 1)).into_iter().collect();
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(left) = node.left.as_deref() {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right.as_deref() {
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }
}

fn build_subtree<T>(mut points: Vec<([f64; DIMENSIONS], T)>, depth: usize) -> Option<Box<Node<T>>> {
    if points.is_empty() {
        return None;
    }

    let axis = depth % DIMENSIONS;
    points.sort_by(|a, b| a.0[axis].total_cmp(&b.0[axis]));

    let median = points.len() / 2;
    let right = points.split_off(median + 1);
    let (point, payload) = points.pop()?;
    let left = points;

    Some(Box::new(Node {
        axis,
        split: point[axis],
        point,
        payload,
        left: build_subtree(left, depth + 1),
        right: build_subtree(right, depth + 1),
    }))
}

fn euclidean(a: &[f64; DIMENSIONS], b: &[f64; DIMENSIONS]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
