use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

use super::geometry::NodeSize;
use super::interaction::{Commit, GestureCapture, InteractionController, InteractionState};
use super::model::GraphModel;
use super::render::{self, ViewTransform};
use super::scene;
use super::sync::{DetachHandle, PersistenceSync};
use super::types::{LinkId, Point};
use crate::api::{HttpBackend, LoadedCanvas};
use crate::config::CanvasConfig;
use crate::error::CanvasError;

type PointerListener = Closure<dyn FnMut(MouseEvent)>;

struct Surface {
	canvas: HtmlCanvasElement,
	controller: InteractionController,
	view: ViewTransform,
	width: f64,
	height: f64,
}

impl Surface {
	fn canvas_point(&self, ev: &MouseEvent) -> Point {
		let rect = self.canvas.get_bounding_client_rect();
		self.view
			.screen_to_canvas(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top())
	}
}

/// What the relation editor shows. Derived from the controller after every change.
#[derive(Clone, Debug, PartialEq)]
struct EditorView {
	link: LinkId,
	draft: String,
	confirming_delete: bool,
	saving: bool,
}

fn editor_view(controller: &InteractionController, current: Option<&EditorView>) -> Option<EditorView> {
	let InteractionState::EditingLinkText { link, draft } = controller.state() else {
		return None;
	};
	Some(EditorView {
		link: link.clone(),
		draft: draft.clone(),
		confirming_delete: controller.pending_delete() == Some(link),
		saving: current.is_some_and(|c| c.saving && c.link == *link),
	})
}

#[derive(Clone)]
struct CanvasHandle {
	model: Rc<RefCell<GraphModel>>,
	sync: Rc<PersistenceSync<HttpBackend>>,
	surface: Rc<RefCell<Option<Surface>>>,
	detach: DetachHandle,
	banner: RwSignal<Option<String>>,
	editor: RwSignal<Option<EditorView>>,
}

impl CanvasHandle {
	fn with_surface<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> Option<R> {
		self.surface.borrow_mut().as_mut().map(f)
	}

	/// Once unmounted, any late event only tears down what is left.
	fn teardown_if_detached(&self) -> bool {
		if !self.detach.is_detached() {
			return false;
		}
		self.with_surface(|s| s.controller.reset());
		true
	}

	fn fail(&self, err: &CanvasError) {
		if matches!(err, CanvasError::Detached) {
			return;
		}
		warn!("{err}");
		self.banner.set(Some(err.user_message()));
	}

	fn refresh_editor(&self) {
		let current = self.editor.get_untracked();
		let next = self.surface.borrow().as_ref().and_then(|s| editor_view(&s.controller, current.as_ref()));
		if next != current {
			self.editor.set(next);
		}
	}

	fn pointer_down(&self, ev: &MouseEvent) {
		if !is_primary_button(ev.button()) || self.teardown_if_detached() {
			return;
		}
		let result = self.with_surface(|s| {
			let p = s.canvas_point(ev);
			let mut model = self.model.borrow_mut();
			let target = scene::project(&model, s.controller.state()).hit_test(p);
			s.controller.pointer_down(&mut model, target, p)
		});
		if let Some(Err(e)) = result {
			self.fail(&e);
		}
		self.refresh_editor();
	}

	fn pointer_move(&self, ev: &MouseEvent) {
		if self.teardown_if_detached() {
			return;
		}
		self.with_surface(|s| {
			let p = s.canvas_point(ev);
			s.controller.pointer_move(&mut self.model.borrow_mut(), p);
		});
	}

	fn pointer_up(&self, ev: &MouseEvent) {
		if self.teardown_if_detached() {
			return;
		}
		let commit = self
			.with_surface(|s| {
				let p = s.canvas_point(ev);
				let mut model = self.model.borrow_mut();
				let target = scene::project(&model, s.controller.state()).hit_test(p);
				s.controller.pointer_up(&mut model, target, p)
			})
			.flatten();
		match commit {
			Some(Commit::SavePosition { node, position }) => {
				let sync = self.sync.clone();
				spawn_local(async move {
					sync.save_position(node, position).await;
				});
			}
			Some(Commit::CreateLink(draft)) => {
				let this = self.clone();
				spawn_local(async move {
					let created = this.sync.create_link(draft).await;
					this.with_surface(|s| s.controller.link_settled());
					match created {
						Ok(Some(id)) => this.model.borrow_mut().select_link(&id),
						Ok(None) => {}
						Err(e) => this.fail(&e),
					}
				});
			}
			None => {}
		}
	}

	fn key_down(&self, ev: &KeyboardEvent) {
		if ev.key() != "Escape" || self.teardown_if_detached() {
			return;
		}
		self.with_surface(|s| s.controller.cancel(&mut self.model.borrow_mut()));
		self.refresh_editor();
	}

	fn wheel(&self, ev: &WheelEvent) {
		ev.prevent_default();
		self.with_surface(|s| {
			let rect = s.canvas.get_bounding_client_rect();
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.view
				.zoom_at(ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top(), factor);
		});
	}

	fn edit_draft(&self, text: &str) {
		self.with_surface(|s| s.controller.set_draft(text));
		self.refresh_editor();
	}

	fn save_edit(&self) {
		let Some(edit) = self.with_surface(|s| s.controller.save_edit()).flatten() else {
			return;
		};
		self.editor.update(|e| {
			if let Some(e) = e {
				e.saving = true;
			}
		});
		let this = self.clone();
		spawn_local(async move {
			let link = edit.link.clone();
			match this.sync.update_link_text(edit).await {
				Ok(()) => {
					this.with_surface(|s| s.controller.edit_saved(&link));
					this.editor.set(None);
				}
				Err(e) => {
					this.editor.update(|v| {
						if let Some(v) = v {
							v.saving = false;
						}
					});
					this.fail(&e);
				}
			}
			this.refresh_editor();
		});
	}

	fn cancel_edit(&self) {
		self.with_surface(|s| s.controller.cancel_edit());
		self.model.borrow_mut().clear_selection();
		self.refresh_editor();
	}

	fn request_delete(&self) {
		let Some(link) = self.editor.get_untracked().map(|e| e.link) else {
			return;
		};
		let model = self.model.borrow();
		if let Some(Err(e)) = self.with_surface(|s| s.controller.request_delete(&model, &link)) {
			self.fail(&e);
		}
		drop(model);
		self.refresh_editor();
	}

	fn confirm_delete(&self) {
		let Some(confirmed) = self.with_surface(|s| s.controller.confirm_delete()).flatten() else {
			return;
		};
		self.refresh_editor();
		let this = self.clone();
		spawn_local(async move {
			if let Err(e) = this.sync.delete_link(confirmed).await {
				this.fail(&e);
			}
		});
	}

	fn keep_link(&self) {
		self.with_surface(|s| s.controller.cancel_delete());
		self.refresh_editor();
	}

	fn frame(&self, ctx: &CanvasRenderingContext2d) {
		if let Some(s) = self.surface.borrow().as_ref() {
			let scene = scene::project(&self.model.borrow(), s.controller.state());
			render::render(&scene, &s.view, s.width, s.height, ctx);
		}
	}
}

/// Only the main button drags nodes or draws connections.
fn is_primary_button(button: i16) -> bool {
	button == 0
}

fn visible(shown: bool) -> &'static str {
	if shown { "flex" } else { "none" }
}

/// The document-relationship canvas for one loaded collection.
#[component]
pub fn DocCanvas(
	data: LoadedCanvas,
	api_base: String,
	config: CanvasConfig,
	#[prop(default = false)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let banner = RwSignal::new(None::<String>);
	let editor = RwSignal::new(None::<EditorView>);

	let max_chars = config.max_relation_chars;
	let node_size = NodeSize {
		width: config.node_width,
		height: config.node_height,
	};
	let model = Rc::new(RefCell::new(GraphModel::new(config)));
	model.borrow_mut().load(&data.documents, &data.links, &data.positions);
	let sync = Rc::new(PersistenceSync::new(
		Rc::new(HttpBackend::new(api_base)),
		data.collection_id.clone(),
		model.clone(),
		&data.positions,
	));
	let detach = sync.detach_handle();
	let handle = CanvasHandle {
		model,
		sync,
		surface: Rc::new(RefCell::new(None)),
		detach: detach.clone(),
		banner,
		editor,
	};

	let actor = data.actor;
	let listeners: Rc<RefCell<Option<(PointerListener, PointerListener)>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let handle_init = handle.clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if handle_init.surface.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas;
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			(
				window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
				window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
			)
		} else {
			canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64))
				.filter(|(w, h)| *w > 0.0 && *h > 0.0)
				.unwrap_or((800.0, 600.0))
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => {
					error!("2d context has an unexpected type");
					return;
				}
			},
			_ => {
				error!("canvas has no 2d context");
				return;
			}
		};

		// window-level routing, attached only while a gesture runs
		let on_move = {
			let h = handle_init.clone();
			PointerListener::new(move |ev: MouseEvent| h.pointer_move(&ev))
		};
		let on_up = {
			let h = handle_init.clone();
			PointerListener::new(move |ev: MouseEvent| h.pointer_up(&ev))
		};
		let move_fn: js_sys::Function = on_move.as_ref().unchecked_ref::<js_sys::Function>().clone();
		let up_fn: js_sys::Function = on_up.as_ref().unchecked_ref::<js_sys::Function>().clone();
		*listeners.borrow_mut() = Some((on_move, on_up));

		let capture_window: Window = window.clone();
		let controller = InteractionController::new(actor.clone())
			.with_text_limit(max_chars)
			.with_node_size(node_size)
			.with_capture(move || {
				let _ = capture_window.add_event_listener_with_callback("mousemove", &move_fn);
				let _ = capture_window.add_event_listener_with_callback("mouseup", &up_fn);
				let (window, move_fn, up_fn) = (capture_window.clone(), move_fn.clone(), up_fn.clone());
				GestureCapture::new(move || {
					let _ = window.remove_event_listener_with_callback("mousemove", &move_fn);
					let _ = window.remove_event_listener_with_callback("mouseup", &up_fn);
				})
			});
		*handle_init.surface.borrow_mut() = Some(Surface {
			canvas,
			controller,
			view: ViewTransform::default(),
			width: w,
			height: h,
		});

		let (h, animate_inner) = (handle_init.clone(), animate.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			if h.teardown_if_detached() {
				return;
			}
			h.frame(&ctx);
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	on_cleanup(move || detach.detach());

	let on_mousedown = {
		let h = handle.clone();
		move |ev: MouseEvent| h.pointer_down(&ev)
	};
	let on_wheel = {
		let h = handle.clone();
		move |ev: WheelEvent| h.wheel(&ev)
	};
	let on_keydown = {
		let h = handle.clone();
		move |ev: KeyboardEvent| h.key_down(&ev)
	};
	let on_input = {
		let h = handle.clone();
		move |ev: Event| h.edit_draft(&event_target_value(&ev))
	};
	let on_save = {
		let h = handle.clone();
		move |_: MouseEvent| h.save_edit()
	};
	let on_cancel = {
		let h = handle.clone();
		move |_: MouseEvent| h.cancel_edit()
	};
	let on_delete = {
		let h = handle.clone();
		move |_: MouseEvent| h.request_delete()
	};
	let on_confirm = {
		let h = handle.clone();
		move |_: MouseEvent| h.confirm_delete()
	};
	let on_keep = {
		let h = handle.clone();
		move |_: MouseEvent| h.keep_link()
	};

	view! {
		<div class="doc-canvas" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="doc-canvas__surface"
				tabindex="0"
				on:mousedown=on_mousedown
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; cursor: default; outline: none;"
			/>
			<div
				class="doc-canvas__banner"
				role="alert"
				style="position: absolute; top: 12px; left: 12px; gap: 8px;"
				style:display=move || visible(banner.with(Option::is_some))
			>
				<span>{move || banner.get().unwrap_or_default()}</span>
				<button on:click=move |_: MouseEvent| banner.set(None)>"Dismiss"</button>
			</div>
			<div
				class="doc-canvas__editor"
				role="dialog"
				aria-label="Edit relation"
				style="position: absolute; top: 12px; right: 12px; flex-direction: column; gap: 6px;"
				style:display=move || visible(editor.with(Option::is_some))
			>
				<label>
					"Relation"
					<input
						type="text"
						maxlength=max_chars.to_string()
						prop:value=move || editor.get().map(|e| e.draft).unwrap_or_default()
						on:input=on_input
					/>
				</label>
				<div style:display=move || {
					visible(!editor.with(|e| e.as_ref().is_some_and(|e| e.confirming_delete)))
				}>
					<button
						on:click=on_save
						disabled=move || editor.with(|e| e.as_ref().is_some_and(|e| e.saving))
					>
						"Save"
					</button>
					<button on:click=on_cancel>"Cancel"</button>
					<button class="danger" on:click=on_delete>"Delete"</button>
				</div>
				<div style:display=move || {
					visible(editor.with(|e| e.as_ref().is_some_and(|e| e.confirming_delete)))
				}>
					<span>"Delete this link?"</span>
					<button class="danger" on:click=on_confirm>"Delete"</button>
					<button on:click=on_keep>"Keep"</button>
				</div>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn secondary_buttons_do_not_start_gestures() {
		assert!(is_primary_button(0));
		// middle, right, back, forward
		for button in [1, 2, 3, 4] {
			assert!(!is_primary_button(button));
		}
	}
}
