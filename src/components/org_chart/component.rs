use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, MouseEvent, WheelEvent, Window,
};

use super::chart::{Hit, OrgChart, RenderState};
use super::collaborators::{ClickEvent, Collaborators};
use super::config::ChartConfig;
use super::controller::{self, Activation};
use super::render;
use super::state::{Avatars, CanvasState};
use super::tree::Tree;
use super::types::PersonRecord;

type Shared<T> = Rc<RefCell<Option<T>>>;
type Callback = Closure<dyn FnMut()>;

const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Canvas size: the window when fullscreen, else explicit props, else the
/// parent element's box.
fn measure(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		return window_size(window).unwrap_or(FALLBACK_SIZE);
	}
	let parent = canvas.parent_element();
	let (pw, ph) = parent
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or(FALLBACK_SIZE);
	(width.unwrap_or(pw), height.unwrap_or(ph))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn image(url: &str) -> Option<HtmlImageElement> {
	let img = HtmlImageElement::new().ok()?;
	img.set_src(url);
	Some(img)
}

/// Starts resolving avatars for cards that have not asked yet.
fn request_avatars(avatars: &Avatars, chart: &OrgChart, current: &RenderState) {
	for placed in &current.snapshot.nodes {
		if avatars.borrow().contains_key(&placed.id) {
			continue;
		}
		if let Some(url) = &placed.person.avatar {
			avatars.borrow_mut().insert(placed.id.clone(), image(url));
			continue;
		}
		avatars.borrow_mut().insert(placed.id.clone(), None);
		let (Some(load), Some(node)) = (&chart.collaborators().load_image, chart.tree().find(&placed.id))
		else {
			continue;
		};
		let (pending, avatars, id) = (load(node), Rc::clone(avatars), placed.id.clone());
		wasm_bindgen_futures::spawn_local(async move {
			if let Some(url) = pending.await {
				avatars.borrow_mut().insert(id, image(&url));
			}
		});
	}
}

/// Draws one frame per animation frame for as long as the page lives.
fn start_frame_loop(
	window: &Window,
	state: Shared<CanvasState>,
	ctx: CanvasRenderingContext2d,
	slot: Shared<Callback>,
) {
	let next = Rc::clone(&slot);
	*slot.borrow_mut() = Some(Closure::new(move || {
		let now = js_sys::Date::now();
		if let Some(ref mut s) = *state.borrow_mut() {
			s.tick(now);
			let current = s.chart.borrow().state();
			if let Some(current) = current {
				if s.sync_cycle(current.cycle, now) {
					request_avatars(&s.avatars, &s.chart.borrow(), &current);
				}
				render::render(s, &current, now, &ctx);
			}
		}
		if let (Some(window), Some(cb)) = (web_sys::window(), next.borrow().as_ref()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *slot.borrow() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

/// Keeps a fullscreen canvas matched to the window.
fn listen_for_resize(
	window: &Window,
	state: Shared<CanvasState>,
	canvas: HtmlCanvasElement,
	slot: &Shared<Callback>,
) {
	*slot.borrow_mut() = Some(Closure::new(move || {
		let Some((w, h)) = web_sys::window().as_ref().and_then(window_size) else {
			return;
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		if let Some(ref mut s) = *state.borrow_mut() {
			s.resize(w, h);
		}
	}));
	if let Some(ref cb) = *slot.borrow() {
		if window
			.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())
			.is_err()
		{
			warn!("org chart: resize listener not installed");
		}
	}
}

/// Canvas org chart. Cards toggle on click, the link icon goes to the
/// person's link, drag pans and the wheel zooms.
///
/// Replacing `data` rebuilds the chart from scratch.
#[component]
pub fn OrgChartCanvas(
	/// Root of the organization.
	#[prop(into)]
	data: Signal<PersonRecord>,
	/// Layout, animation and colour options.
	#[prop(optional)]
	config: ChartConfig,
	/// Host callbacks and loaders.
	#[prop(optional)]
	collaborators: Collaborators,
	/// Size the canvas to the window instead of its parent.
	#[prop(default = false)]
	fullscreen: bool,
	/// Fixed width; defaults to the parent's.
	#[prop(default = None)]
	width: Option<f64>,
	/// Fixed height; defaults to the parent's.
	#[prop(default = None)]
	height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<CanvasState> = Rc::new(RefCell::new(None));
	let frame_cb: Shared<Callback> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Callback> = Rc::new(RefCell::new(None));

	let mount_state = Rc::clone(&state);
	Effect::new(move |_| {
		let (Some(canvas), Some(window)) = (canvas_ref.get(), web_sys::window()) else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = measure(&window, &canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let tree = match Tree::new(data.get()) {
			Ok(tree) => tree,
			Err(err) => {
				error!("org chart data rejected: {err}");
				return;
			}
		};
		let chart = OrgChart::new(tree, config.clone(), collaborators.clone());
		*mount_state.borrow_mut() = Some(CanvasState::new(chart, w, h));

		// New data replaces the chart; the frame loop and listeners stay.
		if frame_cb.borrow().is_some() {
			return;
		}
		let Some(ctx) = context_2d(&canvas) else {
			error!("org chart: canvas has no 2d context");
			return;
		};
		if fullscreen && config.should_resize {
			listen_for_resize(&window, Rc::clone(&mount_state), canvas.clone(), &resize_cb);
		}
		start_frame_loop(&window, Rc::clone(&mount_state), ctx, Rc::clone(&frame_cb));
	});

	let pointer = move |ev: &MouseEvent| {
		let rect = canvas_ref
			.get()
			.map(|c| HtmlCanvasElement::from(c).get_bounding_client_rect());
		let (left, top) = rect.map_or((0.0, 0.0), |r| (r.left(), r.top()));
		(ev.client_x() as f64 - left, ev.client_y() as f64 - top)
	};

	let press_state = Rc::clone(&state);
	let on_press = move |ev: MouseEvent| {
		let (x, y) = pointer(&ev);
		if let Some(ref mut s) = *press_state.borrow_mut() {
			s.begin_pan(x, y);
		}
	};

	let drag_state = Rc::clone(&state);
	let on_drag = move |ev: MouseEvent| {
		let (x, y) = pointer(&ev);
		if let Some(ref mut s) = *drag_state.borrow_mut() {
			s.pan_to(x, y);
		}
	};

	let release_state = Rc::clone(&state);
	let on_release = move |_: MouseEvent| {
		if let Some(ref mut s) = *release_state.borrow_mut() {
			s.end_pan();
		}
	};

	let click_state = Rc::clone(&state);
	let on_click = move |ev: MouseEvent| {
		let (x, y) = pointer(&ev);
		// The host may have changed size without a resize listener (not
		// fullscreen, or `shouldResize` off); classify from what it is now.
		let measured = canvas_ref.get().zip(web_sys::window()).map(|(canvas, window)| {
			measure(&window, &HtmlCanvasElement::from(canvas), fullscreen, width, height)
		});
		let (chart, camera, screen, position, elapsed) = {
			let mut guard = click_state.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			if s.take_pan_click() {
				return;
			}
			let position = s.screen_to_chart(x, y);
			if let Some((w, h)) = measured {
				s.track_size(w, h);
			}
			(
				Rc::clone(&s.chart),
				Rc::clone(&s.camera),
				s.screen(),
				position,
				s.elapsed(js_sys::Date::now()),
			)
		};
		let event = ClickEvent { position };
		let hit = chart.borrow().hit_test(position, elapsed);
		match hit {
			Some(Hit::Link(id)) => {
				if let Err(err) = controller::activate_link(&chart.borrow(), &id, event) {
					error!("org chart link click: {err}");
				}
			}
			Some(Hit::Card(id)) => {
				ev.prevent_default();
				wasm_bindgen_futures::spawn_local(async move {
					match controller::activate(&chart, &id, screen, event, &*camera).await {
						Ok(Activation::Rendered(state)) => {
							debug!("node {id} settled in cycle {}", state.cycle)
						}
						Ok(other) => debug!("node {id}: {other:?}"),
						Err(err) => error!("org chart click: {err}"),
					}
				});
			}
			None => {}
		}
	};

	let zoom_state = Rc::clone(&state);
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let (x, y) = pointer(ev.as_ref());
		if let Some(ref mut s) = *zoom_state.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="org-chart-canvas"
			on:mousedown=on_press
			on:mousemove=on_drag
			on:mouseup=on_release.clone()
			on:mouseleave=on_release
			on:click=on_click
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
