//! Pointer activation of a card: veto gate, optional mobile recentre, then
//! the structural toggle or lazy fetch, then a render cycle.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use log::{debug, error, warn};

use super::chart::{Change, OrgChart, RenderState};
use super::collaborators::ClickEvent;
use super::config::Margin;
use super::error::ChartError;
use super::layout::Viewport;
use super::reconcile::Direction;
use super::tree::Toggle;
use super::types::{NodeId, Point};

/// Moves the whole drawing by a translation, resolving once it got there.
pub trait Camera {
	fn recenter(&self, translate: Point, duration: f64) -> LocalBoxFuture<'static, ()>;
}

/// Size of the host element at the moment of the click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screen {
	pub width: f64,
	pub height: f64,
}

#[derive(Debug)]
pub enum Activation {
	/// `on_person_click` returned `false`.
	Vetoed,
	/// The node is still recentring or loading from an earlier activation.
	Busy,
	Rendered(Rc<RenderState>),
}

/// Translation that brings `pos` to the middle of the screen.
pub fn center_translation(pos: Point, screen: Screen, margin: &Margin) -> Point {
	Point::new(
		screen.width / 2.0 - margin.left / 2.0 - pos.x,
		screen.height / 2.0 - margin.top / 2.0 - pos.y,
	)
}

/// Runs one activation of node `id` to completion.
///
/// The chart is never borrowed across an await, so other events can be
/// handled while a fetch or a recentre is in flight; re-activating the same
/// node in that window yields [`Activation::Busy`]. `on_person_click` runs
/// while the chart is borrowed and must not call back into it.
pub async fn activate(
	chart: &Rc<RefCell<OrgChart>>,
	id: &NodeId,
	screen: Screen,
	event: ClickEvent,
	camera: &dyn Camera,
) -> Result<Activation, ChartError> {
	let viewport = {
		let chart = chart.borrow();
		let node = chart
			.tree()
			.find(id)
			.ok_or_else(|| ChartError::UnknownNode(id.clone()))?;
		if chart.is_pending(id) {
			debug!("node {id} busy, activation ignored");
			return Ok(Activation::Busy);
		}
		if let Some(gate) = &chart.collaborators().on_person_click {
			if !gate(node, &event) {
				debug!("activation of node {id} vetoed");
				return Ok(Activation::Vetoed);
			}
		}
		Viewport::classify(screen.width, chart.config().mobile_breakpoint)
	};

	chart.borrow_mut().mark_pending(id.clone());
	let result = run(chart, id, screen, viewport, camera).await;
	chart.borrow_mut().clear_pending(id);
	result
}

async fn run(
	chart: &Rc<RefCell<OrgChart>>,
	id: &NodeId,
	screen: Screen,
	viewport: Viewport,
	camera: &dyn Camera,
) -> Result<Activation, ChartError> {
	if viewport == Viewport::Constrained {
		let (translate, duration) = {
			let chart = chart.borrow();
			let node = chart
				.tree()
				.find(id)
				.ok_or_else(|| ChartError::UnknownNode(id.clone()))?;
			let pos = node.pos.unwrap_or(node.prev);
			(
				center_translation(pos, screen, &chart.config().margin),
				chart.config().recenter_duration,
			)
		};
		camera.recenter(translate, duration).await;
	}

	let fetch = {
		let chart = chart.borrow();
		let node = chart
			.tree()
			.find(id)
			.ok_or_else(|| ChartError::UnknownNode(id.clone()))?;
		if node.needs_fetch() {
			let Some(loader) = &chart.collaborators().load_children else {
				let err = ChartError::MissingLoader { id: id.clone() };
				error!("{err}");
				return Err(err);
			};
			Some(loader.load_children(node))
		} else {
			None
		}
	};

	let toggle = match fetch {
		Some(fetch) => {
			let records = fetch.await.map_err(|source| {
				warn!("loading children of node {id} failed: {source}");
				ChartError::Fetch {
					id: id.clone(),
					source,
				}
			})?;
			debug!("node {id}: {} children loaded", records.len());
			chart.borrow_mut().tree_mut().attach_fetched_children(id, records)?
		}
		None => chart.borrow_mut().tree_mut().toggle_visibility(id)?,
	};

	let direction = match toggle {
		Toggle::Collapsed => Direction::Collapse,
		_ => Direction::Expand,
	};
	let state = chart.borrow_mut().render(
		viewport,
		Some(Change {
			initiator: id.clone(),
			direction,
		}),
	);
	Ok(Activation::Rendered(state))
}

/// The link icon on a card bypasses expand/collapse entirely.
pub fn activate_link(chart: &OrgChart, id: &NodeId, event: ClickEvent) -> Result<(), ChartError> {
	let node = chart
		.tree()
		.find(id)
		.ok_or_else(|| ChartError::UnknownNode(id.clone()))?;
	if let Some(on_link) = &chart.collaborators().on_person_link_click {
		on_link(node, &event);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use futures::channel::oneshot;
	use futures::executor::{LocalPool, block_on};
	use futures::future::FutureExt;
	use futures::task::LocalSpawnExt;

	use super::*;
	use crate::components::org_chart::collaborators::Collaborators;
	use crate::components::org_chart::config::ChartConfig;
	use crate::components::org_chart::error::LoadError;
	use crate::components::org_chart::reconcile::Phase;
	use crate::components::org_chart::tree::{Children, Tree};
	use crate::components::org_chart::types::PersonRecord;

	const DESKTOP: Screen = Screen {
		width: 1280.0,
		height: 800.0,
	};
	const PHONE: Screen = Screen {
		width: 390.0,
		height: 700.0,
	};
	const CLICK: ClickEvent = ClickEvent {
		position: Point::ORIGIN,
	};

	#[derive(Default)]
	struct RecordingCamera {
		moves: RefCell<Vec<(Point, f64)>>,
	}

	impl Camera for RecordingCamera {
		fn recenter(&self, translate: Point, duration: f64) -> LocalBoxFuture<'static, ()> {
			self.moves.borrow_mut().push((translate, duration));
			async {}.boxed_local()
		}
	}

	fn rec(id: &str) -> PersonRecord {
		PersonRecord::new(id, id, "")
	}

	fn mounted(record: PersonRecord, collaborators: Collaborators) -> Rc<RefCell<OrgChart>> {
		let mut chart = OrgChart::new(Tree::new(record).unwrap(), ChartConfig::default(), collaborators);
		chart.render(Viewport::Standard, None);
		Rc::new(RefCell::new(chart))
	}

	fn visible(chart: &Rc<RefCell<OrgChart>>) -> Vec<String> {
		let state = chart.borrow().state().unwrap();
		let mut ids: Vec<String> = state.snapshot.nodes.iter().map(|n| n.id.to_string()).collect();
		ids.sort();
		ids
	}

	fn rendered(activation: Activation) -> Rc<RenderState> {
		match activation {
			Activation::Rendered(state) => state,
			other => panic!("expected a render, got {other:?}"),
		}
	}

	#[test]
	fn expanding_a_collapsed_child_reveals_its_reports() {
		let chart = mounted(
			rec("r").with_children(vec![rec("a").with_children(vec![rec("a1"), rec("a2")]), rec("b")]),
			Collaborators::default(),
		);
		assert_eq!(visible(&chart), ["a", "b", "r"]);
		let stashed = chart.borrow().tree().find(&"a".into()).unwrap().prev;

		let camera = RecordingCamera::default();
		let state = rendered(block_on(activate(&chart, &"a".into(), DESKTOP, CLICK, &camera)).unwrap());

		assert_eq!(visible(&chart), ["a", "a1", "a2", "b", "r"]);
		assert!(matches!(
			chart.borrow().tree().find(&"a".into()).unwrap().children,
			Children::Visible(_)
		));
		for t in state.scene.nodes.iter().filter(|t| matches!(t.node.id.as_str(), "a1" | "a2")) {
			assert_eq!((t.phase, t.from), (Phase::Enter, stashed));
		}
		assert!(camera.moves.borrow().is_empty());
	}

	#[test]
	fn collapsing_on_desktop_skips_the_camera() {
		let chart = mounted(rec("r").with_children(vec![rec("a"), rec("b")]), Collaborators::default());
		let camera = RecordingCamera::default();
		let state = rendered(block_on(activate(&chart, &"r".into(), DESKTOP, CLICK, &camera)).unwrap());

		assert!(camera.moves.borrow().is_empty());
		assert_eq!(visible(&chart), ["r"]);
		assert_eq!(state.change.as_ref().unwrap().direction, Direction::Collapse);
		assert_eq!(state.scene.nodes.iter().filter(|t| t.phase == Phase::Exit).count(), 2);
	}

	#[test]
	fn veto_leaves_everything_untouched() {
		let notified = Rc::new(Cell::new(0));
		let count = Rc::clone(&notified);
		let chart = mounted(
			rec("r").with_children(vec![rec("a"), rec("b")]),
			Collaborators::default()
				.on_person_click(|_, _| false)
				.on_config_change(move |_| count.set(count.get() + 1)),
		);
		assert_eq!(notified.get(), 1);
		let before = chart.borrow().state().unwrap();
		let tree_before = chart.borrow().tree().clone();

		let camera = RecordingCamera::default();
		let outcome = block_on(activate(&chart, &"r".into(), PHONE, CLICK, &camera)).unwrap();

		assert!(matches!(outcome, Activation::Vetoed));
		assert!(Rc::ptr_eq(&before, &chart.borrow().state().unwrap()));
		assert_eq!(chart.borrow().tree(), &tree_before);
		assert_eq!(notified.get(), 1);
		assert!(camera.moves.borrow().is_empty());
	}

	#[test]
	fn mobile_recentres_before_toggling() {
		let chart = mounted(rec("r").with_children(vec![rec("a")]), Collaborators::default());
		let camera = RecordingCamera::default();
		let state = rendered(block_on(activate(&chart, &"a".into(), PHONE, CLICK, &camera)).unwrap());

		let config = ChartConfig::default();
		let a = Point::new(0.0, config.line_depth_y);
		let expected = center_translation(a, PHONE, &config.margin);
		assert_eq!(*camera.moves.borrow(), vec![(expected, config.recenter_duration)]);
		assert_eq!(state.snapshot.viewport, Viewport::Constrained);
		assert!(state.snapshot.nodes.iter().all(|n| n.pos.x == 0.0));
	}

	/// Camera that only lands when the test says so.
	struct HeldCamera {
		landing: RefCell<Option<oneshot::Receiver<()>>>,
		moves: Cell<usize>,
	}

	impl Camera for HeldCamera {
		fn recenter(&self, _: Point, _: f64) -> LocalBoxFuture<'static, ()> {
			self.moves.set(self.moves.get() + 1);
			let landing = self.landing.borrow_mut().take();
			async move {
				if let Some(landing) = landing {
					let _ = landing.await;
				}
			}
			.boxed_local()
		}
	}

	#[test]
	fn mobile_toggle_waits_for_the_camera() {
		let chart = mounted(
			rec("r").with_children(vec![rec("a").with_children(vec![rec("a1")]), rec("b")]),
			Collaborators::default(),
		);
		let tree_before = chart.borrow().tree().clone();
		let (land, landing) = oneshot::channel();
		let camera = Rc::new(HeldCamera {
			landing: RefCell::new(Some(landing)),
			moves: Cell::new(0),
		});

		let mut pool = LocalPool::new();
		let outcome = Rc::new(RefCell::new(None));
		{
			let (chart, outcome, camera) = (Rc::clone(&chart), Rc::clone(&outcome), Rc::clone(&camera));
			pool.spawner()
				.spawn_local(async move {
					let result = activate(&chart, &"a".into(), PHONE, CLICK, &*camera).await;
					*outcome.borrow_mut() = Some(result);
				})
				.unwrap();
		}
		pool.run_until_stalled();
		assert_eq!(camera.moves.get(), 1);
		assert_eq!(chart.borrow().tree(), &tree_before);
		assert_eq!(chart.borrow().state().unwrap().cycle, 1);

		// Clicking the same card mid-flight neither moves the camera again nor toggles.
		let again = block_on(activate(&chart, &"a".into(), PHONE, CLICK, &*camera)).unwrap();
		assert!(matches!(again, Activation::Busy));
		assert_eq!(camera.moves.get(), 1);
		assert_eq!(chart.borrow().tree(), &tree_before);

		land.send(()).unwrap();
		pool.run_until_stalled();
		assert!(matches!(outcome.borrow_mut().take(), Some(Ok(Activation::Rendered(_)))));
		let state = chart.borrow().state().unwrap();
		assert_eq!(state.cycle, 2);
		assert_eq!(state.snapshot.viewport, Viewport::Constrained);
		assert_eq!(visible(&chart), ["a", "a1", "b", "r"]);
	}

	#[test]
	fn lazy_children_arrive_at_parent_position_and_collapsed() {
		let loads = Rc::new(Cell::new(0));
		let counter = Rc::clone(&loads);
		let chart = mounted(
			rec("r").with_children(vec![rec("n").unfetched()]),
			Collaborators::default().with_loader(move |node| {
				counter.set(counter.get() + 1);
				assert_eq!(node.id.as_str(), "n");
				async {
					Ok::<_, LoadError>(vec![
						rec("c").with_children(vec![rec("c1")]),
						rec("d"),
					])
				}
			}),
		);
		let n_before = chart.borrow().tree().find(&"n".into()).unwrap().clone();

		let camera = RecordingCamera::default();
		let state = rendered(block_on(activate(&chart, &"n".into(), DESKTOP, CLICK, &camera)).unwrap());

		assert_eq!(loads.get(), 1);
		assert_eq!(state.cycle, 2);
		assert_eq!(visible(&chart), ["c", "d", "n", "r"]);
		let chart = chart.borrow();
		let n = chart.tree().find(&"n".into()).unwrap();
		let kids: Vec<&str> = n.visible_children().iter().map(|c| c.id.as_str()).collect();
		assert_eq!(kids, ["c", "d"]);
		assert!(matches!(n.visible_children()[0].children, Children::Collapsed(_)));
		for t in state.scene.nodes.iter().filter(|t| t.phase == Phase::Enter) {
			assert_eq!(t.from, n_before.prev);
		}
	}

	#[test]
	fn attached_children_inherit_pre_fetch_position() {
		let (tx, rx) = oneshot::channel::<Vec<PersonRecord>>();
		let rx = RefCell::new(Some(rx));
		let chart = mounted(
			rec("r").with_children(vec![rec("m"), rec("n").unfetched()]),
			Collaborators::default().with_loader(move |_| {
				let rx = rx.borrow_mut().take().expect("loaded once");
				async move { rx.await.map_err(|e| LoadError::Request(e.to_string())) }
			}),
		);
		let n_before = chart.borrow().tree().find(&"n".into()).unwrap().clone();
		let tree_before = chart.borrow().tree().clone();

		let mut pool = LocalPool::new();
		let outcome = Rc::new(RefCell::new(None));
		{
			let (chart, outcome) = (Rc::clone(&chart), Rc::clone(&outcome));
			pool.spawner()
				.spawn_local(async move {
					let camera = RecordingCamera::default();
					let result = activate(&chart, &"n".into(), DESKTOP, CLICK, &camera).await;
					*outcome.borrow_mut() = Some(result);
				})
				.unwrap();
		}
		pool.run_until_stalled();
		assert_eq!(chart.borrow().tree(), &tree_before);

		// A second click while the fetch is outstanding is ignored.
		let camera = RecordingCamera::default();
		let again = block_on(activate(&chart, &"n".into(), DESKTOP, CLICK, &camera)).unwrap();
		assert!(matches!(again, Activation::Busy));

		tx.send(vec![rec("c"), rec("d")]).unwrap();
		pool.run_until_stalled();
		assert!(matches!(outcome.borrow_mut().take(), Some(Ok(Activation::Rendered(_)))));

		// The render stashes the laid-out positions, so compare against what
		// attach installed before layout: both children start from n's stash.
		let state = chart.borrow().state().unwrap();
		for id in ["c", "d"] {
			let t = state.scene.nodes.iter().find(|t| t.node.id.as_str() == id).unwrap();
			assert_eq!(t.from, n_before.prev);
		}
	}

	#[test]
	fn missing_loader_is_reported_without_mutation() {
		let chart = mounted(rec("r").with_children(vec![rec("n").unfetched()]), Collaborators::default());
		let before = chart.borrow().tree().clone();
		let camera = RecordingCamera::default();
		let err = block_on(activate(&chart, &"n".into(), DESKTOP, CLICK, &camera)).unwrap_err();
		assert!(matches!(err, ChartError::MissingLoader { .. }));
		assert_eq!(chart.borrow().tree(), &before);
		assert!(!chart.borrow().is_pending(&"n".into()));
	}

	#[test]
	fn failed_fetch_keeps_node_unfetched() {
		let chart = mounted(
			rec("r").with_children(vec![rec("n").unfetched()]),
			Collaborators::default().with_sync_loader(|_| Err(LoadError::Request("503".into()))),
		);
		let camera = RecordingCamera::default();
		let err = block_on(activate(&chart, &"n".into(), DESKTOP, CLICK, &camera)).unwrap_err();
		assert!(matches!(err, ChartError::Fetch { source: LoadError::Request(_), .. }));
		let chart = chart.borrow();
		assert!(chart.tree().find(&"n".into()).unwrap().needs_fetch());
		assert_eq!(chart.state().unwrap().cycle, 1);
	}

	#[test]
	fn unknown_node_is_an_error() {
		let chart = mounted(rec("r"), Collaborators::default());
		let camera = RecordingCamera::default();
		let err = block_on(activate(&chart, &"ghost".into(), DESKTOP, CLICK, &camera)).unwrap_err();
		assert!(matches!(err, ChartError::UnknownNode(_)));
	}

	#[test]
	fn link_click_does_not_toggle() {
		let clicked = Rc::new(RefCell::new(None));
		let sink = Rc::clone(&clicked);
		let chart = mounted(
			rec("r").with_children(vec![rec("a")]),
			Collaborators::default()
				.on_person_link_click(move |node, _| *sink.borrow_mut() = Some(node.id.clone())),
		);
		activate_link(&chart.borrow(), &"r".into(), CLICK).unwrap();
		assert_eq!(*clicked.borrow(), Some(NodeId::from("r")));
		assert_eq!(visible(&chart), ["a", "r"]);
	}
}
