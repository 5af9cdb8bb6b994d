use std::collections::HashSet;

use super::error::ChartError;
use super::types::{NodeId, Person, PersonRecord, Point};

/// Where a node keeps its descendants. A single slot makes it impossible for
/// a node to hold visible and collapsed children at the same time.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Children {
	#[default]
	None,
	Visible(Vec<ChartNode>),
	Collapsed(Vec<ChartNode>),
}

/// Outcome of [`ChartNode::toggle_visibility`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
	Expanded,
	Collapsed,
	/// Descendants exist server-side but were never fetched; nothing changed.
	NeedsFetch,
	Leaf,
}

/// One person in the chart, with layout bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartNode {
	/// Unique across the whole tree, collapsed subtrees included.
	pub id: NodeId,
	/// What the card shows.
	pub person: Person,
	/// Reports exist that may not have been fetched yet.
	pub has_child: bool,
	/// Drawn with the accent border.
	pub is_highlight: bool,
	/// Loaded reports, shown or folded.
	pub children: Children,
	/// Unset until the first layout pass places the node.
	pub pos: Option<Point>,
	/// Position at the end of the last render cycle, start of the next transition.
	pub prev: Point,
	/// Level below the root, as of the last layout pass.
	pub depth: usize,
}

impl From<PersonRecord> for ChartNode {
	fn from(record: PersonRecord) -> Self {
		let children = match record.children {
			Some(children) if !children.is_empty() => {
				Children::Visible(children.into_iter().map(ChartNode::from).collect())
			}
			_ => Children::None,
		};
		Self {
			id: record.id,
			person: record.person,
			has_child: record.has_child,
			is_highlight: record.is_highlight,
			children,
			pos: None,
			prev: Point::ORIGIN,
			depth: 0,
		}
	}
}

impl ChartNode {
	/// Children that take part in layout; empty when folded or unloaded.
	pub fn visible_children(&self) -> &[ChartNode] {
		match &self.children {
			Children::Visible(children) => children,
			_ => &[],
		}
	}

	fn all_children(&self) -> &[ChartNode] {
		match &self.children {
			Children::Visible(children) | Children::Collapsed(children) => children,
			Children::None => &[],
		}
	}

	fn all_children_mut(&mut self) -> &mut [ChartNode] {
		match &mut self.children {
			Children::Visible(children) | Children::Collapsed(children) => children,
			Children::None => &mut [],
		}
	}

	/// Has loaded children, shown or not.
	pub fn is_branch(&self) -> bool {
		!matches!(self.children, Children::None)
	}

	/// Activating this node has to go through the child loader first.
	pub fn needs_fetch(&self) -> bool {
		!self.is_branch() && self.has_child
	}

	/// Direct reports, loaded or not.
	pub fn report_count(&self) -> usize {
		match self.all_children().len() {
			0 => self.person.total_reports.unwrap_or(0) as usize,
			n => n,
		}
	}

	/// Swaps visible and folded children. Unloaded and leaf nodes are left
	/// as they are; the result says which case applied.
	pub fn toggle_visibility(&mut self) -> Toggle {
		match std::mem::take(&mut self.children) {
			Children::Visible(children) => {
				self.children = Children::Collapsed(children);
				Toggle::Collapsed
			}
			Children::Collapsed(children) => {
				self.children = Children::Visible(children);
				Toggle::Expanded
			}
			Children::None if self.has_child => Toggle::NeedsFetch,
			Children::None => Toggle::Leaf,
		}
	}

	/// Collapses this node and, recursively, every subtree below it.
	pub fn collapse(&mut self) {
		if let Children::Visible(children) = std::mem::take(&mut self.children) {
			self.children = Children::Collapsed(children);
		}
		for child in self.all_children_mut() {
			child.collapse();
		}
	}

	/// Installs freshly fetched reports as visible children. They start at
	/// this node's position so they grow out of it instead of the origin, and
	/// anything below them arrives collapsed.
	pub fn attach_fetched_children(&mut self, children: Vec<ChartNode>) -> Toggle {
		if children.is_empty() {
			self.has_child = false;
			self.children = Children::None;
			return Toggle::Leaf;
		}
		let children = children
			.into_iter()
			.map(|mut child| {
				child.collapse();
				child.pos = self.pos;
				child.prev = self.prev;
				child
			})
			.collect();
		self.children = Children::Visible(children);
		Toggle::Expanded
	}

	fn collect_ids(&self, into: &mut Vec<NodeId>) {
		into.push(self.id.clone());
		for child in self.all_children() {
			child.collect_ids(into);
		}
	}

	fn find(&self, id: &NodeId) -> Option<&ChartNode> {
		if &self.id == id {
			return Some(self);
		}
		self.all_children().iter().find_map(|c| c.find(id))
	}

	fn find_mut(&mut self, id: &NodeId) -> Option<&mut ChartNode> {
		if &self.id == id {
			return Some(self);
		}
		self.all_children_mut().iter_mut().find_map(|c| c.find_mut(id))
	}

	fn collapse_below(&mut self, depth: usize) {
		if depth == 0 {
			self.collapse();
			return;
		}
		for child in self.all_children_mut() {
			child.collapse_below(depth - 1);
		}
	}

	fn for_each_visible_mut(&mut self, f: &mut impl FnMut(&mut ChartNode)) {
		f(self);
		if let Children::Visible(children) = &mut self.children {
			for child in children {
				child.for_each_visible_mut(f);
			}
		}
	}
}

/// The whole organization, rooted at a single person.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
	root: ChartNode,
}

impl Tree {
	pub fn new(record: PersonRecord) -> Result<Self, ChartError> {
		let mut root = ChartNode::from(record);
		root.pos = Some(Point::ORIGIN);
		let tree = Self { root };
		check_unique(&tree.ids(), &HashSet::new())?;
		Ok(tree)
	}

	/// Every id in the tree, collapsed subtrees included.
	pub fn ids(&self) -> Vec<NodeId> {
		let mut ids = Vec::new();
		self.root.collect_ids(&mut ids);
		ids
	}

	pub fn find(&self, id: &NodeId) -> Option<&ChartNode> {
		self.root.find(id)
	}

	pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut ChartNode> {
		self.root.find_mut(id)
	}

	/// Leaves the first `depth` levels expanded and folds everything deeper.
	pub fn collapse_below(&mut self, depth: usize) {
		self.root.collapse_below(depth);
	}

	pub fn toggle_visibility(&mut self, id: &NodeId) -> Result<Toggle, ChartError> {
		self.find_mut(id)
			.map(ChartNode::toggle_visibility)
			.ok_or_else(|| ChartError::UnknownNode(id.clone()))
	}

	/// Attaches fetched records below `id`. Fails without touching the tree if
	/// the node is unknown or a record reuses an id already in the chart.
	pub fn attach_fetched_children(
		&mut self,
		id: &NodeId,
		records: Vec<PersonRecord>,
	) -> Result<Toggle, ChartError> {
		let children: Vec<ChartNode> = records.into_iter().map(ChartNode::from).collect();
		let mut fetched = Vec::new();
		for child in &children {
			child.collect_ids(&mut fetched);
		}
		let existing: HashSet<NodeId> = self.ids().into_iter().collect();
		check_unique(&fetched, &existing)?;
		let node = self
			.find_mut(id)
			.ok_or_else(|| ChartError::UnknownNode(id.clone()))?;
		Ok(node.attach_fetched_children(children))
	}

	/// Visible nodes in pre-order with their parent's index in the returned
	/// list. The order is what layout uses to break sibling ties.
	pub fn visible_nodes(&self) -> Vec<(&ChartNode, Option<usize>)> {
		let mut out = Vec::new();
		let mut stack: Vec<(&ChartNode, Option<usize>)> = vec![(&self.root, None)];
		while let Some((node, parent)) = stack.pop() {
			let index = out.len();
			out.push((node, parent));
			for child in node.visible_children().iter().rev() {
				stack.push((child, Some(index)));
			}
		}
		out
	}

	/// Visits visible nodes mutably, in the same order as [`Tree::visible_nodes`].
	pub fn for_each_visible_mut(&mut self, f: &mut impl FnMut(&mut ChartNode)) {
		self.root.for_each_visible_mut(f);
	}

	/// Makes each visible node's current position the start of the next
	/// transition. Hidden nodes keep the position they had when they left.
	pub fn stash_positions(&mut self) {
		self.for_each_visible_mut(&mut |node| {
			if let Some(pos) = node.pos {
				node.prev = pos;
			}
		});
	}
}

fn check_unique(ids: &[NodeId], existing: &HashSet<NodeId>) -> Result<(), ChartError> {
	let mut seen = HashSet::new();
	for id in ids {
		if existing.contains(id) || !seen.insert(id) {
			return Err(ChartError::DuplicateId(id.clone()));
		}
	}
	Ok(())
}
