use doc_canvas::config::AppConfig;
use doc_canvas::{App, init_logging};
use leptos::prelude::*;

fn main() {
	let config = AppConfig::from_page();
	init_logging(config.level());
	leptos::mount::mount_to_body(move || view! { <App config=config /> })
}
