use std::collections::HashSet;
use std::rc::Rc;

use log::debug;

use super::collaborators::{ChartChange, Collaborators};
use super::config::ChartConfig;
use super::layout::{Snapshot, Viewport, layout};
use super::reconcile::{Direction, Extent, Origin, Phase, Scene, reconcile};
use super::tree::Tree;
use super::types::{NodeId, Point};

/// Side length of the link affordance in a card's top-right corner.
pub const LINK_ICON_SIZE: f64 = 16.0;
const LINK_ICON_INSET: f64 = 8.0;

/// The node that triggered a cycle and which way it went.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
	pub initiator: NodeId,
	pub direction: Direction,
}

/// Result of one render cycle. A new value replaces the old one every cycle;
/// the previous snapshot is only ever read, never patched.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
	pub cycle: u64,
	pub snapshot: Snapshot,
	pub scene: Scene,
	pub extent: Extent,
	pub change: Option<Change>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hit {
	Card(NodeId),
	Link(NodeId),
}

/// Top-left corner of the link icon relative to its card.
pub fn link_icon_offset(config: &ChartConfig) -> Point {
	Point::new(config.node_width - LINK_ICON_SIZE - LINK_ICON_INSET, LINK_ICON_INSET)
}

pub struct OrgChart {
	tree: Tree,
	config: ChartConfig,
	collaborators: Collaborators,
	state: Option<Rc<RenderState>>,
	pending: HashSet<NodeId>,
}

impl OrgChart {
	pub fn new(mut tree: Tree, config: ChartConfig, collaborators: Collaborators) -> Self {
		tree.collapse_below(config.initial_depth);
		Self {
			tree,
			config,
			collaborators,
			state: None,
			pending: HashSet::new(),
		}
	}

	pub fn tree(&self) -> &Tree {
		&self.tree
	}

	pub(super) fn tree_mut(&mut self) -> &mut Tree {
		&mut self.tree
	}

	pub fn config(&self) -> &ChartConfig {
		&self.config
	}

	pub fn collaborators(&self) -> &Collaborators {
		&self.collaborators
	}

	/// State of the last completed cycle, `None` before the first render.
	pub fn state(&self) -> Option<Rc<RenderState>> {
		self.state.clone()
	}

	pub(super) fn is_pending(&self, id: &NodeId) -> bool {
		self.pending.contains(id)
	}

	pub(super) fn mark_pending(&mut self, id: NodeId) {
		self.pending.insert(id);
	}

	pub(super) fn clear_pending(&mut self, id: &NodeId) {
		self.pending.remove(id);
	}

	/// One full cycle: layout, diff against the last snapshot, stash the new
	/// positions and publish the resulting state.
	pub fn render(&mut self, viewport: Viewport, change: Option<Change>) -> Rc<RenderState> {
		let next = layout(&mut self.tree, viewport, &self.config);
		let origin = change
			.as_ref()
			.and_then(|c| next.node(&c.initiator))
			.or_else(|| next.nodes.iter().find(|n| n.parent.is_none()))
			.map(Origin::of)
			.unwrap_or(Origin {
				from: Point::ORIGIN,
				to: Point::ORIGIN,
			});
		let previous = self.state.as_ref().map(|s| &s.snapshot);
		let scene = reconcile(previous, &next, origin, self.config.animation_duration);
		self.tree.stash_positions();

		let state = Rc::new(RenderState {
			cycle: self.state.as_ref().map_or(1, |s| s.cycle + 1),
			extent: Extent::of(&next),
			snapshot: next,
			scene,
			change,
		});
		self.state = Some(Rc::clone(&state));
		debug!(
			"render cycle {}: {} visible, {} transitions ({:?})",
			state.cycle,
			state.snapshot.nodes.len(),
			state.scene.nodes.len(),
			viewport
		);

		if let Some(notify) = &self.collaborators.on_config_change {
			let change = state.change.as_ref();
			notify(&ChartChange {
				config: &self.config,
				cycle: state.cycle,
				viewport,
				initiator: change.and_then(|c| self.tree.find(&c.initiator)),
				direction: change.map_or(Direction::Expand, |c| c.direction),
				visible: state.snapshot.nodes.len(),
				extent: state.extent,
			});
		}
		state
	}

	/// Topmost card under `point` (chart coordinates) as drawn `elapsed` ms
	/// into the current cycle, distinguishing the link icon from the rest of
	/// the card. Cards on their way out cannot be hit.
	pub fn hit_test(&self, point: Point, elapsed: f64) -> Option<Hit> {
		let state = self.state.as_ref()?;
		let (w, h) = (self.config.node_width, self.config.node_height);
		let icon = link_icon_offset(&self.config);
		let t = state.scene.progress(elapsed);
		let drawn = state.scene.nodes.iter().filter(|n| n.phase != Phase::Exit);
		drawn.rev().find_map(|transition| {
			let node = &transition.node;
			let at = transition.from.lerp(transition.to, t);
			let (dx, dy) = (point.x - at.x, point.y - at.y);
			if !(0.0..=w).contains(&dx) || !(0.0..=h).contains(&dy) {
				return None;
			}
			let on_icon = node.person.link.is_some()
				&& (icon.x..=icon.x + LINK_ICON_SIZE).contains(&dx)
				&& (icon.y..=icon.y + LINK_ICON_SIZE).contains(&dy);
			Some(if on_icon {
				Hit::Link(node.id.clone())
			} else {
				Hit::Card(node.id.clone())
			})
		})
	}
}
