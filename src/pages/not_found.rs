use leptos::prelude::*;
use leptos_router::components::A;

/// 404 page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<h1>"Page not found"</h1>
		<p>"Canvases live at " <code>"/collections/<id>/canvas"</code> "."</p>
		<A href="/">"Back"</A>
	}
}
