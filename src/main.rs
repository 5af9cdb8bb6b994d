// Everything but leptos is used through the library target.
#![allow(unused_crate_dependencies)]

use leptos::prelude::*;
use org_chart_canvas::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App)
}
