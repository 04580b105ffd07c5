#![allow(dead_code)]

use reconcile_dom::{
	memory::{MemoryDom, MemoryEvent, NodeId},
	Dom, Reconciler, VNode,
};
use std::{cell::Cell, rc::Rc};

pub type V = VNode<MemoryDom>;

pub fn init_logging() {
	// Fails harmlessly if another test in this binary got there first.
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::TRACE)
		.try_init();
}

/// A fresh document and a reconciler for it.
pub fn setup() -> (MemoryDom, Reconciler<MemoryDom>, NodeId) {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	let reconciler = Reconciler::new(dom.clone());
	(dom, reconciler, body)
}

/// `textContent` of each child of `parent`.
pub fn child_texts(dom: &MemoryDom, parent: NodeId) -> Vec<String> {
	dom.child_nodes(&parent).into_iter().map(|child| dom.text_content(child)).collect()
}

/// A listener that counts its invocations.
pub fn counter() -> (Rc<Cell<usize>>, impl 'static + Fn(&MemoryEvent)) {
	let count = Rc::new(Cell::new(0));
	let listener = {
		let count = Rc::clone(&count);
		move |_: &MemoryEvent| count.set(count.get() + 1)
	};
	(count, listener)
}
