//! Host-supplied hooks the chart calls out to.

use std::future::{Future, ready};
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use super::config::ChartConfig;
use super::error::LoadError;
use super::layout::Viewport;
use super::reconcile::{Direction, Extent};
use super::tree::ChartNode;
use super::types::{PersonRecord, Point};

/// Fetches the direct reports of a node whose children were never loaded.
///
/// Loaders answering from memory and loaders going over the network share
/// this one asynchronous contract.
pub trait ChildLoader {
	fn load_children(&self, node: &ChartNode) -> LocalBoxFuture<'static, Result<Vec<PersonRecord>, LoadError>>;
}

struct AsyncLoader<F>(F);

impl<F, Fut> ChildLoader for AsyncLoader<F>
where
	F: Fn(&ChartNode) -> Fut,
	Fut: Future<Output = Result<Vec<PersonRecord>, LoadError>> + 'static,
{
	fn load_children(&self, node: &ChartNode) -> LocalBoxFuture<'static, Result<Vec<PersonRecord>, LoadError>> {
		(self.0)(node).boxed_local()
	}
}

struct SyncLoader<F>(F);

impl<F> ChildLoader for SyncLoader<F>
where
	F: Fn(&ChartNode) -> Result<Vec<PersonRecord>, LoadError>,
{
	fn load_children(&self, node: &ChartNode) -> LocalBoxFuture<'static, Result<Vec<PersonRecord>, LoadError>> {
		ready((self.0)(node)).boxed_local()
	}
}

/// Pointer details handed to click observers, in chart coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickEvent {
	pub position: Point,
}

/// What changed in a completed render cycle, as seen by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartChange<'a> {
	pub config: &'a ChartConfig,
	pub cycle: u64,
	pub viewport: Viewport,
	pub initiator: Option<&'a ChartNode>,
	pub direction: Direction,
	pub visible: usize,
	pub extent: Extent,
}

pub type PersonClick = Rc<dyn Fn(&ChartNode, &ClickEvent) -> bool>;
pub type PersonLinkClick = Rc<dyn Fn(&ChartNode, &ClickEvent)>;
pub type ConfigChange = Rc<dyn Fn(&ChartChange<'_>)>;
/// Resolves an avatar URL for a person without one.
pub type ImageLoader = Rc<dyn Fn(&ChartNode) -> LocalBoxFuture<'static, Option<String>>>;

/// All callbacks are optional; a missing loader only matters once a node
/// with unfetched reports is activated.
#[derive(Clone, Default)]
pub struct Collaborators {
	/// Fetches reports of nodes marked `hasChild` without loaded children.
	pub load_children: Option<Rc<dyn ChildLoader>>,
	/// Returning `false` vetoes the activation.
	pub on_person_click: Option<PersonClick>,
	/// The card's link icon was clicked.
	pub on_person_link_click: Option<PersonLinkClick>,
	/// Called once at the end of every render cycle.
	pub on_config_change: Option<ConfigChange>,
	/// Supplies avatars for people whose record has none.
	pub load_image: Option<ImageLoader>,
}

impl Collaborators {
	/// Sets an asynchronous child loader.
	pub fn with_loader<F, Fut>(mut self, loader: F) -> Self
	where
		F: Fn(&ChartNode) -> Fut + 'static,
		Fut: Future<Output = Result<Vec<PersonRecord>, LoadError>> + 'static,
	{
		self.load_children = Some(Rc::new(AsyncLoader(loader)));
		self
	}

	/// Sets a child loader that answers immediately.
	pub fn with_sync_loader<F>(mut self, loader: F) -> Self
	where
		F: Fn(&ChartNode) -> Result<Vec<PersonRecord>, LoadError> + 'static,
	{
		self.load_children = Some(Rc::new(SyncLoader(loader)));
		self
	}

	/// Sets the activation gate; see [`Collaborators::on_person_click`].
	pub fn on_person_click(mut self, f: impl Fn(&ChartNode, &ClickEvent) -> bool + 'static) -> Self {
		self.on_person_click = Some(Rc::new(f));
		self
	}

	/// Sets the link icon handler.
	pub fn on_person_link_click(mut self, f: impl Fn(&ChartNode, &ClickEvent) + 'static) -> Self {
		self.on_person_link_click = Some(Rc::new(f));
		self
	}

	/// Sets the per-cycle observer.
	pub fn on_config_change(mut self, f: impl Fn(&ChartChange<'_>) + 'static) -> Self {
		self.on_config_change = Some(Rc::new(f));
		self
	}

	/// Sets the avatar resolver.
	pub fn with_image_loader<F, Fut>(mut self, f: F) -> Self
	where
		F: Fn(&ChartNode) -> Fut + 'static,
		Fut: Future<Output = Option<String>> + 'static,
	{
		self.load_image = Some(Rc::new(move |node: &ChartNode| f(node).boxed_local()));
		self
	}
}
