use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use log::error;

use crate::api::{HttpBackend, LoadedCanvas, load_canvas};
use crate::components::doc_canvas::DocCanvas;
use crate::config::AppConfig;

#[derive(Clone, Debug, PartialEq)]
enum LoadState {
	Loading,
	Ready(LoadedCanvas),
	Failed(String),
}

/// Canvas of the collection named in the route.
#[component]
pub fn CanvasPage() -> impl IntoView {
	let params = use_params_map();
	let config = use_context::<AppConfig>().unwrap_or_default();
	let state = RwSignal::new(LoadState::Loading);
	let api_base = config.api_base.clone();

	Effect::new(move |_| {
		let Some(id) = params.with(|p| p.get("id")) else {
			state.set(LoadState::Failed("No collection was selected.".into()));
			return;
		};
		state.set(LoadState::Loading);
		let backend = HttpBackend::new(api_base.clone());
		spawn_local(async move {
			let loaded = load_canvas(&backend, &id).await;
			// a newer navigation owns the page now
			if params.with_untracked(|p| p.get("id")).as_deref() != Some(id.as_str()) {
				return;
			}
			match loaded {
				Ok(data) => state.set(LoadState::Ready(data)),
				Err(e) => {
					error!("{e}");
					state.set(LoadState::Failed(e.user_message()));
				}
			}
		});
	});

	let (api_base, canvas) = (config.api_base, config.canvas);
	view! {
		<div class="fullscreen-graph">
			{move || match state.get() {
				LoadState::Loading => view! { <p class="doc-canvas__status">"Loading collection…"</p> }.into_any(),
				LoadState::Failed(message) => {
					view! {
						<div class="doc-canvas__error" role="alert">
							<h1>"This collection could not be opened"</h1>
							<p>{message}</p>
							<A href="/">"Back"</A>
						</div>
					}
						.into_any()
				}
				LoadState::Ready(data) => {
					view! {
						<DocCanvas data=data api_base=api_base.clone() config=canvas.clone() fullscreen=true />
					}
						.into_any()
				}
			}}
		</div>
	}
}
