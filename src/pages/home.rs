use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use log::{info, warn};
use serde_json::{Value, json};

use crate::components::org_chart::{
	ChartConfig, ChartNode, Collaborators, LoadError, OrgChartCanvas, PersonRecord,
};

/// Taller rows than the stock config so connector curves clear the cards.
const CHART_CONFIG: &str = r#"{ "lineDepthY": 240, "nodeSpacing": 24, "initialDepth": 1 }"#;

/// Simulated round trip of the people service.
const FETCH_DELAY_MS: u32 = 400;

/// Share of simulated directory requests that time out.
const FLAKY_RATE: f64 = 0.1;

const SAMPLE_ORG: &str = r#"{
	"id": 1,
	"person": { "name": "Ada Lovelace", "title": "Chief Executive Officer", "department": "Board", "link": "https://en.wikipedia.org/wiki/Ada_Lovelace" },
	"children": [
		{
			"id": 2,
			"person": { "name": "Grace Hopper", "title": "Chief Technology Officer", "department": "Engineering" },
			"children": [
				{ "id": 5, "person": { "name": "Ken Thompson", "title": "Platform Lead", "department": "Engineering", "totalReports": 4 }, "hasChild": true },
				{ "id": 6, "person": { "name": "Barbara Liskov", "title": "Architecture Lead", "department": "Engineering", "totalReports": 3 }, "hasChild": true }
			]
		},
		{
			"id": 3,
			"person": { "name": "Katherine Johnson", "title": "Chief Financial Officer", "department": "Finance", "totalReports": 2 },
			"hasChild": true
		},
		{
			"id": 4,
			"person": { "name": "Alan Kay", "title": "Head of Design", "department": "Design" },
			"isHighlight": true
		}
	]
}"#;

const TITLES: &[&str] = &[
	"Staff Engineer",
	"Senior Engineer",
	"Analyst",
	"Designer",
	"Product Manager",
	"Engineer",
];

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Response body a people directory would send for the reports of `node`.
fn fake_reports(node: &ChartNode) -> Value {
	let count = node
		.person
		.total_reports
		.map(|n| n as usize)
		.unwrap_or(2)
		.max(1);
	let reports = (0..count)
		.map(|i| {
			let id = format!("{}-{}", node.id, i + 1);
			let seed = id.bytes().map(usize::from).sum::<usize>() + i;
			let mut report = json!({
				"id": id,
				"person": {
					"name": format!("Person {id}"),
					"title": TITLES[seed % TITLES.len()],
					"department": node.person.department,
				},
			});
			// Roughly a third of reports manage a team of their own.
			if rand_simple(seed) < 0.33 {
				report["hasChild"] = json!(true);
				report["person"]["totalReports"] = json!(1 + (rand_simple(seed * 7) * 4.0) as u32);
			}
			report
		})
		.collect();
	Value::Array(reports)
}

/// Initials avatar as an inline SVG data URL.
fn initials_avatar(node: &ChartNode) -> String {
	let initials: String = node
		.person
		.name
		.split_whitespace()
		.filter_map(|w| w.chars().next())
		.take(2)
		.collect();
	let svg = format!(
		"<svg xmlns='http://www.w3.org/2000/svg' width='84' height='84'>\
		 <circle cx='42' cy='42' r='42' fill='#cbd5e1'/>\
		 <text x='42' y='52' font-family='sans-serif' font-size='30' text-anchor='middle' fill='#1e293b'>{initials}</text>\
		 </svg>"
	);
	format!(
		"data:image/svg+xml;charset=utf-8,{}",
		String::from(js_sys::encode_uri_component(&svg))
	)
}

fn collaborators() -> Collaborators {
	Collaborators::default()
		.with_loader(|node: &ChartNode| {
			let body = fake_reports(node);
			let timed_out = js_sys::Math::random() < FLAKY_RATE;
			async move {
				TimeoutFuture::new(FETCH_DELAY_MS).await;
				if timed_out {
					return Err(LoadError::Request("directory timed out".into()));
				}
				serde_json::from_value::<Vec<PersonRecord>>(body)
					.map_err(|err| LoadError::Malformed(err.to_string()))
			}
		})
		.with_image_loader(|node: &ChartNode| {
			let url = initials_avatar(node);
			async move { Some(url) }
		})
		.on_person_click(|node, _| {
			info!("clicked {} ({})", node.person.name, node.id);
			true
		})
		.on_person_link_click(|node, _| {
			if let (Some(window), Some(link)) = (web_sys::window(), node.person.link.as_deref()) {
				let _ = window.open_with_url_and_target(link, "_blank");
			}
		})
		.on_config_change(|change| {
			info!(
				"chart cycle {}: {} visible, extent {:?}",
				change.cycle, change.visible, change.extent
			);
		})
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let org = match serde_json::from_str::<PersonRecord>(SAMPLE_ORG) {
		Ok(org) => org,
		Err(err) => {
			return view! { <p>"Sample org chart is malformed: " {err.to_string()}</p> }.into_any();
		}
	};
	let config = ChartConfig::from_json(CHART_CONFIG).unwrap_or_else(|err| {
		warn!("chart config rejected, using defaults: {err}");
		ChartConfig::default()
	});
	let org_data = Signal::derive(move || org.clone());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<OrgChartCanvas
					data=org_data
					config=config
					collaborators=collaborators()
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Organization Chart"</h1>
					<p class="subtitle">"Click a card to expand or collapse it. Scroll to zoom. Drag to pan."</p>
				</div>
			</div>
		</ErrorBoundary>
	}
	.into_any()
}
