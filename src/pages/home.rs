use leptos::prelude::*;

/// Landing page. Collections are opened from the knowledge base itself.
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<div class="graph-overlay">
			<h1>"Collection canvas"</h1>
			<p class="subtitle">
				"Open a collection's canvas to arrange its documents. Drag nodes to reposition, "
				"drag between the dots on their sides to link them, click a link's marker to describe it. "
				"Scroll to zoom."
			</p>
		</div>
	}
}
