//! User actions and the re-render loop.
//!
//! The [`Controller`] subscribes to its [`ProgressStore`] once. Every store mutation then
//! re-renders synchronously inside the call that caused it: mutate, persist, notify, render.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::catalog::{Item, ItemId};
use crate::graph_index::GraphIndex;
use crate::progress::*;
use crate::render::{Renderer, RenderPass, Surface};
use crate::unlock::{Evaluator, ProgressSummary};

/// Asked before a click toggles an item, stands in for the confirmation popup.
pub trait Confirm {
	/// Returning `false` leaves progress untouched.
	fn confirm(&mut self, item: &Item, currently_watched: bool) -> bool;
}

impl<F: FnMut(&Item, bool) -> bool> Confirm for F {
	fn confirm(&mut self, item: &Item, currently_watched: bool) -> bool {
		self(item, currently_watched)
	}
}

pub struct Controller<B: KeyValueBackend, S: Surface + 'static> {
	store: ProgressStore<B>,
	index: Rc<GraphIndex>,
	renderer: Rc<RefCell<Renderer<S>>>,
	/// Item acted on by the pending mutation, consumed by the listener.
	focus: Rc<RefCell<Option<ItemId>>>,
	last_pass: Rc<RefCell<Option<RenderPass>>>,
	subscription: SubscriptionId,
}

impl<B: KeyValueBackend, S: Surface + 'static> Controller<B, S> {
	pub fn new(index: GraphIndex, mut store: ProgressStore<B>, renderer: Renderer<S>) -> Self {
		let index = Rc::new(index);
		let renderer = Rc::new(RefCell::new(renderer));
		let focus = Rc::new(RefCell::new(None::<ItemId>));
		let last_pass = Rc::new(RefCell::new(None::<RenderPass>));

		let subscription = {
			let index = index.clone();
			let renderer = renderer.clone();
			let focus = focus.clone();
			let last_pass = last_pass.clone();
			store.subscribe(move |event, state| {
				let focus = focus.borrow_mut().take();
				log::debug!("Re-rendering after {:?}", event);
				let pass = renderer.borrow_mut().render(&index, state, focus.as_deref());
				*last_pass.borrow_mut() = Some(pass);
			})
		};

		Self { store, index, renderer, focus, last_pass, subscription }
	}

	pub fn store(&self) -> &ProgressStore<B> {
		&self.store
	}

	/// Listeners registered here run after the controller's own re-render.
	pub fn store_mut(&mut self) -> &mut ProgressStore<B> {
		&mut self.store
	}

	pub fn index(&self) -> &GraphIndex {
		&self.index
	}

	pub fn renderer(&self) -> Ref<'_, Renderer<S>> {
		self.renderer.borrow()
	}

	/// The listener that re-renders after every store mutation, `None` once it has been removed.
	///
	/// Unsubscribing it through [`store_mut`](Self::store_mut) stops all automatic re-rendering,
	/// only [`refresh`](Self::refresh) updates the surface after that.
	pub fn subscription(&self) -> Option<SubscriptionId> {
		Some(self.subscription).filter(|id| self.store.is_subscribed(*id))
	}

	/// The pass produced by the most recent render, action-triggered or not.
	pub fn last_pass(&self) -> Option<RenderPass> {
		self.last_pass.borrow().clone()
	}

	/// Renders the current progress. Call on load and whenever the viewport changes.
	pub fn refresh(&mut self) -> RenderPass {
		let pass = self.renderer.borrow_mut().render(&self.index, self.store.state(), None);
		*self.last_pass.borrow_mut() = Some(pass.clone());
		pass
	}

	/// Returns the new watched flag, or `None` if `id` is not in the catalog.
	pub fn toggle_watched(&mut self, id: &str) -> crate::Result<Option<bool>> {
		if !self.index.contains(id) {
			log::warn!("Ignoring toggle of unknown item \"{}\"", id);
			return Ok(None)
		}
		*self.focus.borrow_mut() = Some(id.to_string());
		let watched = self.store.toggle(id)?;
		log::info!("Marked \"{}\" as {}", id, if watched { "watched" } else { "unwatched" });
		Ok(Some(watched))
	}

	/// Handles a click on a drawn node. Returns `true` if progress changed.
	///
	/// Clicks on nodes that aren't interactive are ignored without asking `confirm`.
	pub fn click(&mut self, id: &str, confirm: &mut impl Confirm) -> crate::Result<bool> {
		if !self.renderer.borrow().is_interactive(id) {
			log::debug!("Ignoring click on non-interactive node \"{}\"", id);
			return Ok(false)
		}
		let Some(item) = self.index.get(id) else { return Ok(false) };
		if !confirm.confirm(item.item(), self.store.is_watched(id)) {
			log::debug!("Click on \"{}\" was not confirmed", id);
			return Ok(false)
		}
		Ok(self.toggle_watched(id)?.is_some())
	}

	/// Marks the whole catalog watched with a single write and a single re-render.
	pub fn mark_all_watched(&mut self) -> crate::Result<()> {
		let ids: Vec<ItemId> = self.index.items().map(|i| i.id().clone()).collect();
		log::info!("Marking all {} items as watched", ids.len());
		self.store.set_many(ids, true)
	}

	/// Forgets all progress. The re-render snaps back to the initial view.
	pub fn clear_all(&mut self) -> crate::Result<()> {
		log::info!("Clearing all progress");
		self.focus.borrow_mut().take();
		self.store.clear()
	}

	pub fn evaluator(&self) -> Evaluator<'_> {
		Evaluator::new(&self.index, self.store.state())
	}

	pub fn highest_unlocked_phase(&self) -> u32 {
		self.evaluator().highest_unlocked_phase()
	}

	pub fn summary(&self) -> ProgressSummary {
		self.evaluator().progress_summary()
	}
}
