use image::GrayImage;
use std::collections::VecDeque;

use crate::geometry::GridPoint;
use crate::mask::NEIGHBORS_8;

pub type NodeId = usize;

const NO_NODE: usize = usize::MAX;

/// Undirected graph over skeleton pixels; every pair of 8-adjacent pixels is an edge.
#[derive(Debug, Clone, Default)]
pub struct SkeletonGraph {
    pub nodes: Vec<GridPoint>,
    pub adjacency: Vec<Vec<NodeId>>,
}

struct Traversal {
    distance: Vec<usize>,
    parent: Vec<NodeId>,
}

impl SkeletonGraph {
    /// Nodes are numbered in raster order, so lower ids are higher up in the image.
    pub fn from_skeleton(skeleton: &GrayImage) -> Self {
        let width = skeleton.width() as usize;
        let height = skeleton.height() as usize;
        let mut id_grid = vec![NO_NODE; width * height];
        let mut nodes = Vec::new();

        for (x, y, p) in skeleton.enumerate_pixels() {
            if p[0] != 0 {
                id_grid[y as usize * width + x as usize] = nodes.len();
                nodes.push(GridPoint::new(x as i32, y as i32));
            }
        }

        let adjacency = nodes
            .iter()
            .map(|p| {
                NEIGHBORS_8
                    .iter()
                    .filter_map(|(dx, dy)| {
                        let nx = p.x + dx;
                        let ny = p.y + dy;
                        if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                            return None;
                        }
                        let id = id_grid[ny as usize * width + nx as usize];
                        (id != NO_NODE).then_some(id)
                    })
                    .collect()
            })
            .collect();

        Self { nodes, adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency[id].len()
    }

    /// Degree-1 nodes, in raster order.
    pub fn endpoints(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| self.degree(id) == 1)
            .collect()
    }

    fn bfs(&self, start: NodeId) -> Traversal {
        let mut distance = vec![usize::MAX; self.nodes.len()];
        let mut parent = vec![NO_NODE; self.nodes.len()];
        let mut queue = VecDeque::new();
        distance[start] = 0;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for &next in &self.adjacency[node] {
                if distance[next] == usize::MAX {
                    distance[next] = distance[node] + 1;
                    parent[next] = node;
                    queue.push_back(next);
                }
            }
        }

        Traversal { distance, parent }
    }

    /// Shortest hop-count path between two nodes, or empty when they are disconnected.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Vec<GridPoint> {
        let traversal = self.bfs(from);
        self.walk_back(&traversal, from, to)
    }

    fn walk_back(&self, traversal: &Traversal, from: NodeId, to: NodeId) -> Vec<GridPoint> {
        if traversal.distance[to] == usize::MAX {
            return Vec::new();
        }
        let mut path = Vec::with_capacity(traversal.distance[to] + 1);
        let mut current = to;
        path.push(self.nodes[current]);
        while current != from {
            current = traversal.parent[current];
            path.push(self.nodes[current]);
        }
        path.reverse();
        path
    }

    fn farthest_endpoint(&self, traversal: &Traversal, endpoints: &[NodeId]) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for &e in endpoints {
            let d = traversal.distance[e];
            if d == usize::MAX {
                continue;
            }
            if best.map_or(true, |b| d > traversal.distance[b]) {
                best = Some(e);
            }
        }
        best
    }

    /// Longest shortest-path between two endpoints.
    ///
    /// Each connected component is searched separately. A component that is a
    /// tree gets two breadth-first sweeps; one with a cycle has every endpoint
    /// pair checked, since the sweeps can stop short of the diameter there.
    /// Empty when no component has two endpoints (closed loops, isolated pixels).
    pub fn longest_endpoint_path(&self) -> Vec<GridPoint> {
        let endpoints = self.endpoints();
        let mut component = vec![NO_NODE; self.nodes.len()];
        let mut best: Option<(usize, NodeId, NodeId)> = None;

        for &start in &endpoints {
            if component[start] != NO_NODE {
                continue;
            }
            let first = self.bfs(start);
            let mut node_count = 0usize;
            let mut degree_sum = 0usize;
            for (id, d) in first.distance.iter().enumerate() {
                if *d != usize::MAX {
                    component[id] = start;
                    node_count += 1;
                    degree_sum += self.degree(id);
                }
            }

            let members: Vec<NodeId> = endpoints
                .iter()
                .copied()
                .filter(|&e| component[e] == start)
                .collect();
            let has_cycle = degree_sum / 2 >= node_count;
            let candidate = if has_cycle {
                self.farthest_pair_exhaustive(&members)
            } else {
                self.farthest_pair_double_sweep(&first, &members)
            };

            if let Some((hops, u, v)) = candidate {
                if hops > 0 && best.map_or(true, |(b, _, _)| hops > b) {
                    best = Some((hops, u, v));
                }
            }
        }

        match best {
            Some((_, u, v)) => self.oriented_path(u, v),
            None => Vec::new(),
        }
    }

    /// Exact on trees only.
    fn farthest_pair_double_sweep(
        &self,
        first: &Traversal,
        endpoints: &[NodeId],
    ) -> Option<(usize, NodeId, NodeId)> {
        let u = self.farthest_endpoint(first, endpoints)?;
        let second = self.bfs(u);
        let v = self.farthest_endpoint(&second, endpoints)?;
        Some((second.distance[v], u, v))
    }

    fn farthest_pair_exhaustive(&self, endpoints: &[NodeId]) -> Option<(usize, NodeId, NodeId)> {
        let mut best: Option<(usize, NodeId, NodeId)> = None;
        for (i, &a) in endpoints.iter().enumerate() {
            let traversal = self.bfs(a);
            for &b in &endpoints[i + 1..] {
                let d = traversal.distance[b];
                if d == usize::MAX || d == 0 {
                    continue;
                }
                if best.map_or(true, |(h, _, _)| d > h) {
                    best = Some((d, a, b));
                }
            }
        }
        best
    }

    /// Reference search over every endpoint pair of the whole graph. Quadratic in the
    /// endpoint count.
    pub fn longest_endpoint_path_exhaustive(&self) -> Vec<GridPoint> {
        match self.farthest_pair_exhaustive(&self.endpoints()) {
            Some((_, a, b)) => self.oriented_path(a, b),
            None => Vec::new(),
        }
    }

    /// Path between `a` and `b`, starting from whichever endpoint comes first in raster order.
    fn oriented_path(&self, a: NodeId, b: NodeId) -> Vec<GridPoint> {
        let (from, to) = if self.nodes[a].raster_key() <= self.nodes[b].raster_key() {
            (a, b)
        } else {
            (b, a)
        };
        self.shortest_path(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::FOREGROUND;
    use crate::skeleton::skeletonize;
    use image::Luma;

    fn skeleton_from(width: u32, height: u32, pixels: &[(u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x, y) in pixels {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
        mask
    }

    fn line(x0: u32, x1: u32, y: u32) -> Vec<(u32, u32)> {
        (x0..=x1).map(|x| (x, y)).collect()
    }

    /// 1-pixel square ring over 10..=18 with tails of 2 (up), 7 (down) and 6 (left, right) pixels.
    fn ring_with_tails() -> Vec<(u32, u32)> {
        let mut p = Vec::new();
        for i in 10..=18 {
            p.extend([(i, 10), (i, 18)]);
        }
        for i in 11..18 {
            p.extend([(10, i), (18, i)]);
        }
        p.extend([(14, 9), (14, 8)]);
        p.extend((19..=25).map(|y| (14, y)));
        p.extend(line(4, 9, 14));
        p.extend(line(19, 24, 14));
        p
    }

    #[test]
    fn test_graph_counts() {
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(10, 3, &line(1, 5, 1)));
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.endpoints().len(), 2);
        assert_eq!(graph.nodes[0], GridPoint::new(1, 1));
    }

    #[test]
    fn test_straight_line_path_spans_both_ends() {
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(20, 3, &line(2, 17, 1)));
        let path = graph.longest_endpoint_path();
        assert_eq!(path.len(), 16);
        assert_eq!(path.first(), Some(&GridPoint::new(2, 1)));
        assert_eq!(path.last(), Some(&GridPoint::new(17, 1)));
    }

    #[test]
    fn test_short_spur_is_ignored() {
        // Long horizontal run with a 2-pixel stub hanging off the middle.
        let mut pixels = line(0, 20, 5);
        pixels.push((10, 6));
        pixels.push((10, 7));
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(25, 10, &pixels));
        let path = graph.longest_endpoint_path();
        assert_eq!(path.first(), Some(&GridPoint::new(0, 5)));
        assert_eq!(path.last(), Some(&GridPoint::new(20, 5)));
        assert!(!path.contains(&GridPoint::new(10, 7)));
    }

    #[test]
    fn test_closed_loop_has_no_path() {
        let mut pixels = Vec::new();
        for i in 2..8 {
            pixels.push((i, 2));
            pixels.push((i, 7));
        }
        for i in 3..7 {
            pixels.push((2, i));
            pixels.push((7, i));
        }
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(10, 10, &pixels));
        assert!(graph.endpoints().is_empty());
        assert!(graph.longest_endpoint_path().is_empty());
        assert!(graph.longest_endpoint_path_exhaustive().is_empty());
    }

    #[test]
    fn test_single_pixel_has_no_path() {
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(4, 4, &[(1, 1)]));
        assert!(graph.longest_endpoint_path().is_empty());
    }

    #[test]
    fn test_picks_longest_component() {
        let mut pixels = line(0, 4, 1);
        pixels.extend(line(0, 12, 6));
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(15, 8, &pixels));
        let path = graph.longest_endpoint_path();
        assert_eq!(path.len(), 13);
        assert_eq!(path[0], GridPoint::new(0, 6));
    }

    #[test]
    fn test_path_is_simple_and_connected() {
        let mut pixels = line(1, 8, 1);
        pixels.extend((2..10).map(|i| (8 + i - 1, i)));
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(20, 12, &pixels));
        let path = graph.longest_endpoint_path();
        for pair in path.windows(2) {
            assert!(pair[0].distance_squared(pair[1]) <= 2);
        }
        let mut unique = path.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), path.len());
    }

    #[test]
    fn test_double_sweep_matches_exhaustive_search() {
        let shapes: Vec<Vec<(u32, u32)>> = vec![
            line(3, 30, 4),
            // Y shape with uneven arms.
            {
                let mut p = line(2, 15, 10);
                p.extend((1..8).map(|i| (15 + i, 10 - i)));
                p.extend((1..4).map(|i| (15 + i, 10 + i)));
                p
            },
            // Comb: spine with several short teeth.
            {
                let mut p = line(1, 30, 3);
                for x in [5, 11, 17, 23] {
                    p.push((x, 4));
                    p.push((x, 5));
                }
                p
            },
            // Diagonal staircase.
            (0..20).map(|i| (i + 2, i + 1)).collect(),
            ring_with_tails(),
            // Loop hanging off a long spine, as left by a hole in a thick stroke.
            {
                let mut p = line(1, 12, 15);
                for i in 13..=19 {
                    p.extend([(i, 12), (i, 18)]);
                }
                p.extend([(12, 13), (12, 14), (12, 16), (12, 17)]);
                p.extend([(20, 13), (20, 14), (20, 16), (20, 17)]);
                p.extend(line(20, 22, 15));
                p.extend((16..=27).map(|y| (16, y)));
                p
            },
        ];

        for pixels in shapes {
            let graph = SkeletonGraph::from_skeleton(&skeleton_from(40, 30, &pixels));
            let fast = graph.longest_endpoint_path();
            let slow = graph.longest_endpoint_path_exhaustive();
            assert_eq!(fast.len(), slow.len());
            assert!(fast.len() > 1);
        }
    }

    #[test]
    fn test_loop_takes_longest_route_between_tails() {
        let graph = SkeletonGraph::from_skeleton(&skeleton_from(30, 30, &ring_with_tails()));
        let path = graph.longest_endpoint_path();
        assert_eq!(path.len(), 25);
        assert_eq!(path.first(), Some(&GridPoint::new(4, 14)));
        assert_eq!(path.last(), Some(&GridPoint::new(24, 14)));
    }

    #[test]
    fn test_matches_exhaustive_on_noisy_skeletons() {
        let mut state = 0x2545_f491u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        for trial in 0..200 {
            let mut mask = GrayImage::new(24, 24);
            for pixel in mask.pixels_mut() {
                if next() % 100 < 55 {
                    *pixel = Luma([FOREGROUND]);
                }
            }
            let graph = SkeletonGraph::from_skeleton(&skeletonize(&mask));
            let fast = graph.longest_endpoint_path();
            let slow = graph.longest_endpoint_path_exhaustive();
            assert_eq!(fast.len(), slow.len(), "trial {trial}");
        }
    }
}
