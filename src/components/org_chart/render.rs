use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::chart::{LINK_ICON_SIZE, RenderState, link_icon_offset};
use super::config::ChartConfig;
use super::layout::{PlacedNode, Viewport};
use super::reconcile::Frame;
use super::state::CanvasState;
use super::types::Point;

const CANVAS_BACKGROUND: &str = "#f8fafc";
const BRANCH_ACCENT: &str = "#ebeef2";
const LEAF_ACCENT: &str = "#31c8eb";
const CARD_RADIUS: f64 = 8.0;
const AVATAR_SIZE: f64 = 42.0;
const FOOTER_HEIGHT: f64 = 40.0;

pub fn render(state: &CanvasState, render: &RenderState, now: f64, ctx: &CanvasRenderingContext2d) {
	let chart = state.chart.borrow();
	let config = chart.config();
	let frame = render.scene.frame(state.elapsed(now));

	ctx.set_fill_style_str(CANVAS_BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(&frame, render.snapshot.viewport, config, ctx);
	let avatars = state.avatars.borrow();
	for (node, at) in &frame.nodes {
		let avatar = avatars.get(&node.id).and_then(Option::as_ref);
		draw_card(node, *at, avatar, config, ctx);
	}
	ctx.restore();
}

fn draw_edges(frame: &Frame<'_>, viewport: Viewport, config: &ChartConfig, ctx: &CanvasRenderingContext2d) {
	let (w, h) = (config.node_width, config.node_height);
	ctx.set_stroke_style_str(&config.border_color);
	ctx.set_line_width(1.5);
	for &(source, target) in &frame.edges {
		let (sx, sy) = (source.x + w / 2.0, source.y + h);
		let (tx, ty) = (target.x + w / 2.0, target.y);
		ctx.begin_path();
		ctx.move_to(sx, sy);
		match viewport {
			// Mobile rows overlap vertically; a straight drop reads better.
			Viewport::Constrained => ctx.line_to(tx, ty),
			Viewport::Standard => {
				let mid = (sy + ty) / 2.0;
				ctx.bezier_curve_to(sx, mid, tx, mid, tx, ty);
			}
		}
		ctx.stroke();
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_card(
	node: &PlacedNode,
	at: Point,
	avatar: Option<&HtmlImageElement>,
	config: &ChartConfig,
	ctx: &CanvasRenderingContext2d,
) {
	let (w, h) = (config.node_width, config.node_height);
	let (x, y) = (at.x, at.y);
	let accent = if node.is_branch { BRANCH_ACCENT } else { LEAF_ACCENT };

	rounded_rect(ctx, x, y, w, h, CARD_RADIUS);
	ctx.set_fill_style_str(&config.background_color);
	ctx.fill();
	ctx.set_stroke_style_str(if node.is_highlight { config.reports_color.as_str() } else { accent });
	ctx.set_line_width(if node.is_highlight { 3.0 } else { 2.0 });
	ctx.stroke();

	rounded_rect(ctx, x, y + h - FOOTER_HEIGHT, w, FOOTER_HEIGHT, 5.0);
	ctx.set_fill_style_str(accent);
	ctx.fill();

	let header = node.person.department.as_deref().unwrap_or(&node.person.title);
	ctx.set_text_align("center");
	ctx.set_font("bold 12px sans-serif");
	ctx.set_fill_style_str(&config.name_color);
	let _ = ctx.fill_text_with_max_width(header, x + w / 2.0, y + 20.0, w - 20.0);
	ctx.set_text_align("start");

	ctx.set_stroke_style_str(LEAF_ACCENT);
	ctx.set_global_alpha(0.3);
	ctx.set_line_width(1.0);
	for rule in [30.0, 85.0] {
		ctx.begin_path();
		ctx.move_to(x + 10.0, y + rule);
		ctx.line_to(x + w - 10.0, y + rule);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);

	if let Some(avatar) = avatar {
		if avatar.complete() {
			let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
				avatar,
				x + 20.0,
				y + 36.0,
				AVATAR_SIZE,
				AVATAR_SIZE,
			);
		}
	}

	let text_x = x + 20.0 + AVATAR_SIZE + 10.0;
	let text_w = w - (text_x - x) - 10.0;
	ctx.set_font("16px sans-serif");
	ctx.set_fill_style_str(&config.name_color);
	let _ = ctx.fill_text_with_max_width(&node.person.name, text_x, y + 55.0, text_w);
	ctx.set_font("12px sans-serif");
	ctx.set_fill_style_str(&config.title_color);
	let _ = ctx.fill_text_with_max_width(&node.person.title, text_x, y + 73.0, text_w);

	ctx.set_font("600 16px sans-serif");
	ctx.set_fill_style_str(&config.reports_color);
	let label = match node.reports {
		0 => "No reports".to_string(),
		1 => "1 report".to_string(),
		n => format!("{n} reports"),
	};
	let _ = ctx.fill_text(&label, x + 70.0, y + h - 15.0);

	if node.person.link.is_some() {
		draw_link_icon(ctx, x, y, config);
	}
}

/// Arrow-out-of-box glyph marking the person's external link.
fn draw_link_icon(ctx: &CanvasRenderingContext2d, x: f64, y: f64, config: &ChartConfig) {
	let icon = link_icon_offset(config);
	let (ix, iy, s) = (x + icon.x, y + icon.y, LINK_ICON_SIZE);
	ctx.set_stroke_style_str(&config.title_color);
	ctx.set_line_width(1.5);
	ctx.begin_path();
	ctx.move_to(ix + s * 0.45, iy + s * 0.1);
	ctx.line_to(ix + s * 0.1, iy + s * 0.1);
	ctx.line_to(ix + s * 0.1, iy + s * 0.9);
	ctx.line_to(ix + s * 0.9, iy + s * 0.9);
	ctx.line_to(ix + s * 0.9, iy + s * 0.55);
	ctx.move_to(ix + s * 0.6, iy + s * 0.1);
	ctx.line_to(ix + s * 0.9, iy + s * 0.1);
	ctx.line_to(ix + s * 0.9, iy + s * 0.4);
	ctx.move_to(ix + s * 0.9, iy + s * 0.1);
	ctx.line_to(ix + s * 0.45, iy + s * 0.55);
	ctx.stroke();
}
