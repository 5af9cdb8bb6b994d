use super::layout::{PlacedNode, Snapshot};
use super::types::{NodeId, Point};

/// Smallest extent reported, even for a lone root card.
const MIN_LEFT: f64 = -70.0;
const MIN_RIGHT: f64 = 70.0;
const MIN_DEEPEST: f64 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Enter,
	Update,
	Exit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Expand,
	Collapse,
}

/// The node whose activation caused the cycle. Entering nodes grow out of
/// `from` (its stashed position) and exiting nodes shrink into `to` (its new
/// position).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Origin {
	pub from: Point,
	pub to: Point,
}

impl Origin {
	pub fn of(node: &PlacedNode) -> Self {
		Self {
			from: node.prev,
			to: node.pos,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeTransition {
	pub node: PlacedNode,
	pub phase: Phase,
	pub from: Point,
	pub to: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeTransition {
	pub child: NodeId,
	pub phase: Phase,
	pub from: (Point, Point),
	pub to: (Point, Point),
}

/// Everything that moves during one cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	/// Paint order: exiting nodes first, then the new snapshot's order.
	pub nodes: Vec<NodeTransition>,
	pub edges: Vec<EdgeTransition>,
	pub duration: f64,
}

/// One sampled animation frame.
pub struct Frame<'a> {
	pub nodes: Vec<(&'a PlacedNode, Point)>,
	pub edges: Vec<(Point, Point)>,
}

fn ease_cubic_in_out(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0);
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

impl Scene {
	pub fn is_finished(&self, elapsed: f64) -> bool {
		elapsed >= self.duration
	}

	/// Eased completion in `0.0..=1.0`.
	pub fn progress(&self, elapsed: f64) -> f64 {
		if self.duration <= 0.0 {
			1.0
		} else {
			ease_cubic_in_out(elapsed / self.duration)
		}
	}

	/// Interpolated positions `elapsed` ms into the cycle. Exiting nodes and
	/// edges disappear once the transition completes.
	pub fn frame(&self, elapsed: f64) -> Frame<'_> {
		let t = self.progress(elapsed);
		let done = self.is_finished(elapsed);
		Frame {
			nodes: self
				.nodes
				.iter()
				.filter(|n| !(done && n.phase == Phase::Exit))
				.map(|n| (&n.node, n.from.lerp(n.to, t)))
				.collect(),
			edges: self
				.edges
				.iter()
				.filter(|e| !(done && e.phase == Phase::Exit))
				.map(|e| (e.from.0.lerp(e.to.0, t), e.from.1.lerp(e.to.1, t)))
				.collect(),
		}
	}
}

/// Diffs the previously rendered snapshot against the next one.
pub fn reconcile(previous: Option<&Snapshot>, next: &Snapshot, origin: Origin, duration: f64) -> Scene {
	let mut nodes = Vec::with_capacity(next.nodes.len());
	let mut edges = Vec::with_capacity(next.edges.len());

	if let Some(previous) = previous {
		for old in previous.nodes.iter().filter(|n| !next.contains(&n.id)) {
			nodes.push(NodeTransition {
				node: old.clone(),
				phase: Phase::Exit,
				from: old.pos,
				to: origin.to,
			});
		}
		for old in previous.edges.iter().filter(|e| next.edge(&e.child).is_none()) {
			edges.push(EdgeTransition {
				child: old.child.clone(),
				phase: Phase::Exit,
				from: (old.source, old.target),
				to: (origin.to, origin.to),
			});
		}
	}

	for node in &next.nodes {
		let seen = previous.is_some_and(|p| p.contains(&node.id));
		let (phase, from) = if seen {
			(Phase::Update, node.prev)
		} else {
			(Phase::Enter, origin.from)
		};
		nodes.push(NodeTransition {
			node: node.clone(),
			phase,
			from,
			to: node.pos,
		});
	}

	for edge in &next.edges {
		let (phase, from) = match previous.and_then(|p| p.edge(&edge.child)) {
			Some(old) => (Phase::Update, (old.source, old.target)),
			None => (Phase::Enter, (origin.from, origin.from)),
		};
		edges.push(EdgeTransition {
			child: edge.child.clone(),
			phase,
			from,
			to: (edge.source, edge.target),
		});
	}

	Scene {
		nodes,
		edges,
		duration,
	}
}

/// Bounds of the visible set, for sizing an enclosing viewport or export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
	/// Distance of the leftmost card from the root, as a positive number.
	pub left: f64,
	pub right: f64,
	pub deepest: f64,
}

impl Extent {
	pub fn of(snapshot: &Snapshot) -> Self {
		let (left, right, deepest) = snapshot.nodes.iter().fold(
			(MIN_LEFT, MIN_RIGHT, MIN_DEEPEST),
			|(l, r, d), n| (l.min(n.pos.x), r.max(n.pos.x), d.max(n.pos.y)),
		);
		Self {
			left: -left,
			right,
			deepest,
		}
	}
}
