use reconcile_dom::{
	memory::{ElementDefinition, MemoryDom, NodeId},
	Dom as _, PropValue,
};

mod harness_;
use harness_::{setup, V};

fn define(dom: &MemoryDom, name: &str, suspends: bool) {
	let mut definition = ElementDefinition::new()
		.property("first")
		.property("second")
		.property("third")
		.on_render(|dom: &MemoryDom, element: NodeId| {
			let summary = ["first", "second", "third"]
				.iter()
				.map(|name| match dom.property(element, name) {
					Some(PropValue::String(value)) => value,
					_ => "-".to_owned(),
				})
				.collect::<Vec<_>>()
				.join(",");
			dom.set_attribute(&element, "data-rendered", &summary).unwrap();
		});
	if suspends {
		definition = definition.suspends_rendering();
	}
	assert!(dom.define_element(name, definition));
}

fn element(tag: &'static str, second: &str) -> V {
	V::element(tag).attr("first", "1").attr("second", second).attr("third", "3").build()
}

#[test]
fn suspended_element_renders_once_per_pass() {
	let (dom, mut reconciler, body) = setup();
	define(&dom, "suspended-element", true);

	reconciler.reconcile(&body, &element("suspended-element", "2")).unwrap();
	let node = dom.child_at(&body, 0).unwrap();

	assert_eq!(dom.render_count(node), 1);
	assert_eq!(dom.get_attribute(node, "data-rendered").as_deref(), Some("1,2,3"));

	reconciler.reconcile(&body, &element("suspended-element", "two")).unwrap();
	assert_eq!(dom.render_count(node), 2);
	assert_eq!(dom.get_attribute(node, "data-rendered").as_deref(), Some("1,two,3"));
}

#[test]
fn unchanged_props_do_not_render() {
	let (dom, mut reconciler, body) = setup();
	define(&dom, "suspended-element", true);

	reconciler.reconcile(&body, &element("suspended-element", "2")).unwrap();
	reconciler.reconcile(&body, &element("suspended-element", "2")).unwrap();

	let node = dom.child_at(&body, 0).unwrap();
	assert_eq!(dom.render_count(node), 1);
}

#[test]
fn other_elements_render_per_property() {
	let (dom, mut reconciler, body) = setup();
	define(&dom, "eager-element", false);

	reconciler.reconcile(&body, &element("eager-element", "2")).unwrap();
	let node = dom.child_at(&body, 0).unwrap();

	assert_eq!(dom.render_count(node), 3);
	assert_eq!(dom.get_attribute(node, "data-rendered").as_deref(), Some("1,2,3"));
}
