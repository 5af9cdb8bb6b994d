use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use web_sys::HtmlImageElement;

use super::chart::OrgChart;
use super::controller::{Camera, Screen};
use super::layout::Viewport;
use super::types::{NodeId, Point};

/// Pointer travel (px) after which a press counts as a pan, not a click.
const CLICK_SLOP: f64 = 3.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	fn lerp(self, to: ViewTransform, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A camera move requested by the controller, started on the next frame.
struct Tween {
	to: ViewTransform,
	duration: f64,
	started: Option<(f64, ViewTransform)>,
	done: Option<oneshot::Sender<()>>,
}

/// Camera backed by the canvas view transform. The move itself is driven by
/// [`CanvasState::tick`]; the returned future resolves when it lands.
#[derive(Default)]
pub struct CanvasCamera {
	tween: RefCell<Option<Tween>>,
}

impl Camera for CanvasCamera {
	fn recenter(&self, translate: Point, duration: f64) -> LocalBoxFuture<'static, ()> {
		let (tx, rx) = oneshot::channel();
		let previous = self.tween.borrow_mut().replace(Tween {
			to: ViewTransform {
				x: translate.x,
				y: translate.y,
				k: 1.0,
			},
			duration,
			started: None,
			done: Some(tx),
		});
		// A superseded move still resolves its waiter.
		if let Some(mut old) = previous {
			if let Some(done) = old.done.take() {
				let _ = done.send(());
			}
		}
		async move {
			let _ = rx.await;
		}
		.boxed_local()
	}
}

/// Avatar images by person; `None` while one is still being resolved.
pub type Avatars = Rc<RefCell<HashMap<NodeId, Option<HtmlImageElement>>>>;

pub struct CanvasState {
	pub chart: Rc<RefCell<OrgChart>>,
	pub camera: Rc<CanvasCamera>,
	pub transform: ViewTransform,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	/// Render cycle currently being animated and the time it started.
	pub cycle: u64,
	pub scene_start: f64,
	pub avatars: Avatars,
}

impl CanvasState {
	pub fn new(chart: OrgChart, width: f64, height: f64) -> Self {
		let mut state = Self {
			chart: Rc::new(RefCell::new(chart)),
			camera: Rc::new(CanvasCamera::default()),
			transform: ViewTransform::default(),
			pan: PanState::default(),
			width,
			height,
			cycle: 0,
			scene_start: 0.0,
			avatars: Rc::new(RefCell::new(HashMap::new())),
		};
		state.home();
		let viewport = state.viewport();
		state.chart.borrow_mut().render(viewport, None);
		state
	}

	pub fn screen(&self) -> Screen {
		Screen {
			width: self.width,
			height: self.height,
		}
	}

	pub fn viewport(&self) -> Viewport {
		let chart = self.chart.borrow();
		Viewport::classify(self.width, chart.config().mobile_breakpoint)
	}

	/// Puts the root card at the top centre of the canvas.
	fn home(&mut self) {
		let chart = self.chart.borrow();
		let config = chart.config();
		self.transform = ViewTransform {
			x: self.width / 2.0 - config.node_width / 2.0,
			y: config.margin.top,
			k: 1.0,
		};
	}

	pub fn screen_to_chart(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn begin_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			moved: false,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, x: f64, y: f64) {
		if !self.pan.active {
			return;
		}
		let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
		if dx.hypot(dy) > CLICK_SLOP {
			self.pan.moved = true;
		}
		if self.pan.moved {
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// True when the last press turned into a pan and its click should be dropped.
	pub fn take_pan_click(&mut self) -> bool {
		std::mem::take(&mut self.pan.moved)
	}

	pub fn zoom(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Advances the camera move, if any, to time `now` (ms).
	pub fn tick(&mut self, now: f64) {
		let mut slot = self.camera.tween.borrow_mut();
		let Some(tween) = slot.as_mut() else {
			return;
		};
		let (start, from) = *tween.started.get_or_insert((now, self.transform));
		let t = if tween.duration > 0.0 {
			((now - start) / tween.duration).min(1.0)
		} else {
			1.0
		};
		self.transform = from.lerp(tween.to, ease_out_cubic(t));
		if t >= 1.0 {
			if let Some(done) = tween.done.take() {
				let _ = done.send(());
			}
			*slot = None;
		}
	}

	/// Starts the clock for a new render cycle. Returns true the first time
	/// a given cycle is seen.
	pub fn sync_cycle(&mut self, cycle: u64, now: f64) -> bool {
		if cycle == self.cycle {
			return false;
		}
		self.cycle = cycle;
		self.scene_start = now;
		true
	}

	/// Takes the host size measured at click time. Activations classify the
	/// viewport from it; nothing is re-rendered until the activation does.
	pub fn track_size(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Milliseconds into the cycle currently being animated.
	pub fn elapsed(&self, now: f64) -> f64 {
		now - self.scene_start
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		let before = self.viewport();
		self.width = width;
		self.height = height;
		let after = self.viewport();
		if before != after {
			self.home();
			self.chart.borrow_mut().render(after, None);
		}
	}
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::*;
	use crate::components::org_chart::collaborators::{ClickEvent, Collaborators};
	use crate::components::org_chart::controller::activate;
	use crate::components::org_chart::config::ChartConfig;
	use crate::components::org_chart::tree::Tree;
	use crate::components::org_chart::types::PersonRecord;

	fn state(width: f64) -> CanvasState {
		let tree = Tree::new(PersonRecord::new("r", "Root", "CEO")
			.with_children(vec![PersonRecord::new("a", "A", "CTO")]))
		.unwrap();
		CanvasState::new(
			OrgChart::new(tree, ChartConfig::default(), Collaborators::default()),
			width,
			600.0,
		)
	}

	#[test]
	fn mounting_renders_once_in_the_matching_mode() {
		let s = state(1024.0);
		let chart = s.chart.borrow();
		let render = chart.state().unwrap();
		assert_eq!(render.cycle, 1);
		assert_eq!(render.snapshot.viewport, Viewport::Standard);
		assert_eq!(s.screen_to_chart(s.transform.x, s.transform.y), Point::ORIGIN);
	}

	#[test]
	fn camera_move_resolves_when_it_lands() {
		let mut s = state(400.0);
		let camera = Rc::clone(&s.camera);
		let mut landed = camera.recenter(Point::new(50.0, -40.0), 500.0);

		s.tick(1000.0);
		assert!((&mut landed).now_or_never().is_none());
		s.tick(1250.0);
		assert!(s.transform.x != 50.0);
		s.tick(1500.0);
		assert_eq!(s.transform, ViewTransform { x: 50.0, y: -40.0, k: 1.0 });
		block_on(landed);
	}

	#[test]
	fn short_drags_still_click() {
		let mut s = state(1024.0);
		let start = s.transform;
		s.begin_pan(10.0, 10.0);
		s.pan_to(11.0, 12.0);
		s.end_pan();
		assert!(!s.take_pan_click());
		assert_eq!(s.transform, start);

		s.begin_pan(10.0, 10.0);
		s.pan_to(40.0, 10.0);
		s.end_pan();
		assert!(s.take_pan_click());
		assert_eq!(s.transform.x, start.x + 30.0);
	}

	#[test]
	fn crossing_the_breakpoint_rerenders() {
		let mut s = state(1024.0);
		s.resize(900.0, 600.0);
		assert_eq!(s.chart.borrow().state().unwrap().cycle, 1);
		s.resize(360.0, 600.0);
		let render = s.chart.borrow().state().unwrap();
		assert_eq!(render.cycle, 2);
		assert_eq!(render.snapshot.viewport, Viewport::Constrained);
	}

	#[test]
	fn click_time_size_drives_classification() {
		let mut s = state(1024.0);
		s.track_size(400.0, 700.0);
		assert_eq!(s.screen(), Screen { width: 400.0, height: 700.0 });
		assert_eq!(s.viewport(), Viewport::Constrained);
		// The mount-time render stays until an activation replaces it.
		assert_eq!(s.chart.borrow().state().unwrap().cycle, 1);
	}

	#[test]
	fn narrowed_host_recentres_on_activation() {
		let mut s = state(1024.0);
		s.track_size(400.0, 700.0);
		let (chart, screen) = (Rc::clone(&s.chart), s.screen());
		let (camera, id) = (Rc::clone(&s.camera), NodeId::from("a"));
		let mut activation = Box::pin(activate(
			&chart,
			&id,
			screen,
			ClickEvent {
				position: Point::ORIGIN,
			},
			&*camera,
		));

		// Parked on the recentre until the frame loop lands the camera.
		assert!((&mut activation).now_or_never().is_none());
		s.tick(0.0);
		s.tick(1_000.0);
		block_on(activation).unwrap();
		let render = chart.borrow().state().unwrap();
		assert_eq!(render.cycle, 2);
		assert_eq!(render.snapshot.viewport, Viewport::Constrained);
	}

	#[test]
	fn cycle_clock_restarts_per_cycle() {
		let mut s = state(1024.0);
		assert!(s.sync_cycle(1, 10.0));
		assert!(!s.sync_cycle(1, 20.0));
		assert_eq!(s.scene_start, 10.0);
		assert_eq!(s.elapsed(35.0), 25.0);
	}
}
