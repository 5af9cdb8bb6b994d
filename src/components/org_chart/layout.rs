//! Placement of the visible part of the tree.
//!
//! Standard viewports get a tidy tree: every subtree is laid out on its own,
//! then siblings are pushed apart just far enough that their contours (the
//! leftmost and rightmost card on each level) keep one sibling distance
//! between them, and each parent is centred over its first and last child.
//! The depth axis is always `depth * line_depth_y`.
//!
//! Constrained viewports get a single column in traversal order, which turns
//! the chart into a drill-down list.

use std::collections::HashMap;

use super::config::ChartConfig;
use super::tree::Tree;
use super::types::{NodeId, Person, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Viewport {
	Standard,
	/// Narrow (mobile) screens.
	Constrained,
}

impl Viewport {
	pub fn classify(width: f64, breakpoint: f64) -> Self {
		if width <= breakpoint {
			Self::Constrained
		} else {
			Self::Standard
		}
	}
}

/// A visible node as it stands after a layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedNode {
	pub id: NodeId,
	pub parent: Option<NodeId>,
	pub person: Person,
	pub depth: usize,
	pub pos: Point,
	/// Stashed position from the previous cycle.
	pub prev: Point,
	pub is_branch: bool,
	pub is_highlight: bool,
	pub reports: usize,
}

/// Parent/child endpoint pair, keyed by the child.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub child: NodeId,
	pub source: Point,
	pub target: Point,
}

/// Immutable result of one layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
	pub viewport: Viewport,
	/// Nodes in paint order: later entries are drawn on top.
	pub nodes: Vec<PlacedNode>,
	pub edges: Vec<Edge>,
	index: HashMap<NodeId, usize>,
	edge_index: HashMap<NodeId, usize>,
}

impl Snapshot {
	pub fn node(&self, id: &NodeId) -> Option<&PlacedNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn edge(&self, child: &NodeId) -> Option<&Edge> {
		self.edge_index.get(child).map(|&i| &self.edges[i])
	}

	pub fn contains(&self, id: &NodeId) -> bool {
		self.index.contains_key(id)
	}
}

/// Lays out the visible nodes, writes `pos` and `depth` back into the tree
/// and returns the snapshot. `prev` is left alone.
pub fn layout(tree: &mut Tree, viewport: Viewport, config: &ChartConfig) -> Snapshot {
	let visible = tree.visible_nodes();
	let parents: Vec<Option<usize>> = visible.iter().map(|(_, p)| *p).collect();
	let depths = depths(&parents);

	let positions: Vec<Point> = match viewport {
		Viewport::Standard => {
			let lateral = tidy_offsets(&parents);
			lateral
				.iter()
				.zip(&depths)
				.map(|(&x, &d)| Point::new(x * config.sibling_distance(), d as f64 * config.line_depth_y))
				.collect()
		}
		Viewport::Constrained => (0..visible.len())
			.map(|i| Point::new(0.0, i as f64 * config.line_depth_y))
			.collect(),
	};

	let mut nodes: Vec<PlacedNode> = visible
		.iter()
		.enumerate()
		.map(|(i, (node, parent))| PlacedNode {
			id: node.id.clone(),
			parent: parent.map(|p| visible[p].0.id.clone()),
			person: node.person.clone(),
			depth: depths[i],
			pos: positions[i],
			prev: node.prev,
			is_branch: node.is_branch(),
			is_highlight: node.is_highlight,
			reports: node.report_count(),
		})
		.collect();

	let edges: Vec<Edge> = nodes
		.iter()
		.zip(&parents)
		.filter_map(|(node, parent)| {
			parent.map(|p| Edge {
				child: node.id.clone(),
				source: positions[p],
				target: node.pos,
			})
		})
		.collect();

	let mut i = 0;
	tree.for_each_visible_mut(&mut |node| {
		node.pos = Some(positions[i]);
		node.depth = depths[i];
		i += 1;
	});

	if viewport == Viewport::Standard {
		nodes.reverse();
	}
	let index = nodes
		.iter()
		.enumerate()
		.map(|(i, n)| (n.id.clone(), i))
		.collect();

	let edge_index = edges
		.iter()
		.enumerate()
		.map(|(i, e)| (e.child.clone(), i))
		.collect();

	Snapshot {
		viewport,
		nodes,
		edges,
		index,
		edge_index,
	}
}

/// Parents always precede their children in pre-order.
fn depths(parents: &[Option<usize>]) -> Vec<usize> {
	let mut depths = vec![0; parents.len()];
	for (i, parent) in parents.iter().enumerate() {
		if let Some(p) = parent {
			depths[i] = depths[*p] + 1;
		}
	}
	depths
}

/// Per-level horizontal extent of a subtree, relative to its root.
type Contour = Vec<(f64, f64)>;

/// Lateral coordinates in sibling-distance units, root at zero.
fn tidy_offsets(parents: &[Option<usize>]) -> Vec<f64> {
	let n = parents.len();
	if n == 0 {
		return Vec::new();
	}
	let mut children = vec![Vec::new(); n];
	for (i, parent) in parents.iter().enumerate() {
		if let Some(p) = parent {
			children[*p].push(i);
		}
	}

	// Offset of each node relative to its parent.
	let mut relative = vec![0.0; n];
	// Pre-order guarantees every child index is larger than its parent's, so
	// walking backwards visits each subtree after all of its descendants.
	let mut contours: Vec<Option<Contour>> = vec![None; n];
	for v in (0..n).rev() {
		contours[v] = Some(place_children(&children[v], &mut contours, &mut relative));
	}

	let mut absolute = vec![0.0; n];
	for v in 1..n {
		if let Some(p) = parents[v] {
			absolute[v] = absolute[p] + relative[v];
		}
	}
	absolute
}

fn place_children(
	kids: &[usize],
	contours: &mut [Option<Contour>],
	relative: &mut [f64],
) -> Contour {
	let mut merged: Contour = Vec::new();
	let mut offsets = Vec::with_capacity(kids.len());

	for &kid in kids {
		let contour = contours[kid].take().unwrap_or_else(|| vec![(0.0, 0.0)]);
		let shift = merged
			.iter()
			.zip(&contour)
			.map(|(&(_, right), &(left, _))| right - left + 1.0)
			.fold(f64::NEG_INFINITY, f64::max);
		let shift = if shift.is_finite() { shift } else { 0.0 };
		for (level, &(left, right)) in contour.iter().enumerate() {
			let (left, right) = (left + shift, right + shift);
			match merged.get_mut(level) {
				Some(slot) => *slot = (slot.0.min(left), slot.1.max(right)),
				None => merged.push((left, right)),
			}
		}
		offsets.push(shift);
	}

	let center = match (offsets.first(), offsets.last()) {
		(Some(first), Some(last)) => (first + last) / 2.0,
		_ => 0.0,
	};
	for (&kid, offset) in kids.iter().zip(&offsets) {
		relative[kid] = offset - center;
	}

	let mut contour = vec![(0.0, 0.0)];
	contour.extend(merged.into_iter().map(|(l, r)| (l - center, r - center)));
	contour
}
