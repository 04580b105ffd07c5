use reconcile_dom::{
	dom::{HTML_NAMESPACE, SVG_NAMESPACE},
	memory::{MemoryDom, NodeId},
	Dom as _,
};

mod harness_;
use harness_::{setup, V};

fn namespaces(dom: &MemoryDom, root: NodeId) -> Vec<(String, String)> {
	let mut found = Vec::new();
	let mut pending = vec![root];
	while let Some(node) = pending.pop() {
		if let (Some(tag), Some(namespace)) = (dom.tag_name(&node), dom.namespace(&node)) {
			found.push((tag, namespace));
		}
		pending.extend(dom.child_nodes(&node).into_iter().rev());
	}
	found
}

#[test]
fn svg_root_switches_namespace() {
	let (dom, mut reconciler, body) = setup();

	reconciler
		.reconcile(
			&body,
			&V::element("div")
				.child(V::element("svg").child(V::element("g").child(V::element("circle").attr("r", "5"))))
				.build(),
		)
		.unwrap();
	let div = dom.child_at(&body, 0).unwrap();

	assert_eq!(
		namespaces(&dom, div),
		[
			("div".to_owned(), HTML_NAMESPACE.to_owned()),
			("svg".to_owned(), SVG_NAMESPACE.to_owned()),
			("g".to_owned(), SVG_NAMESPACE.to_owned()),
			("circle".to_owned(), SVG_NAMESPACE.to_owned()),
		]
	);
}

#[test]
fn explicit_namespace_overrides() {
	let (dom, mut reconciler, body) = setup();

	reconciler
		.reconcile(
			&body,
			&V::element("svg")
				.child(V::element("foreignObject").child(V::element("div").attr("xmlns", HTML_NAMESPACE).child(V::element("span"))))
				.build(),
		)
		.unwrap();
	let svg = dom.child_at(&body, 0).unwrap();

	assert_eq!(
		namespaces(&dom, svg),
		[
			("svg".to_owned(), SVG_NAMESPACE.to_owned()),
			("foreignObject".to_owned(), SVG_NAMESPACE.to_owned()),
			("div".to_owned(), HTML_NAMESPACE.to_owned()),
			("span".to_owned(), HTML_NAMESPACE.to_owned()),
		]
	);
}

#[test]
fn children_of_an_svg_parent_inherit() {
	let (dom, mut reconciler, body) = setup();

	reconciler.reconcile(&body, &V::element("svg").build()).unwrap();
	let svg = dom.child_at(&body, 0).unwrap();

	reconciler.reconcile(&svg, &[V::element("rect").build(), V::element("path").build()]).unwrap();

	for child in dom.child_nodes(&svg) {
		assert_eq!(dom.namespace(&child).as_deref(), Some(SVG_NAMESPACE));
	}
}

#[test]
fn svg_tags_keep_their_case_across_passes() {
	let (dom, mut reconciler, body) = setup();
	let vdom = V::element("svg").child(V::element("linearGradient")).build();

	reconciler.reconcile(&body, &vdom).unwrap();
	let svg = dom.child_at(&body, 0).unwrap();
	let gradient = dom.child_at(&svg, 0).unwrap();

	reconciler.reconcile(&body, &vdom).unwrap();

	assert_eq!(dom.child_at(&svg, 0), Some(gradient));
	assert_eq!(dom.tag_name(&gradient).as_deref(), Some("linearGradient"));
}
