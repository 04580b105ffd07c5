use reconcile_dom::{dom::NodeKind, Dom as _};

mod harness_;
use harness_::{child_texts, setup, V};

fn item(key: &'static str) -> V {
	V::element("li").key(key).child(key).build()
}

#[test]
fn fragments_are_spliced() {
	let (dom, mut reconciler, body) = setup();

	reconciler
		.reconcile(
			&body,
			&[
				V::fragment(vec![item("a"), V::fragment(vec![item("b"), V::fragment(Vec::new())])]),
				item("c"),
			],
		)
		.unwrap();

	assert_eq!(child_texts(&dom, body), ["a", "b", "c"]);
	assert!(dom.child_nodes(&body).iter().all(|child| dom.kind(child) == NodeKind::Element));
}

#[test]
fn keys_match_across_fragment_boundaries() {
	let (dom, mut reconciler, body) = setup();

	reconciler.reconcile(&body, &V::fragment(vec![item("a"), item("b")])).unwrap();
	let before = dom.child_nodes(&body);

	reconciler.reconcile(&body, &[item("b"), V::fragment(vec![item("a")])]).unwrap();

	assert_eq!(dom.child_nodes(&body), [before[1], before[0]]);
}

#[test]
fn materialized_fragment_splices_on_insert() {
	let (dom, mut reconciler, body) = setup();

	let fragment = reconciler.materialize(&V::fragment(vec![V::text("x"), V::element("b").build()]), None).unwrap();
	assert_eq!(dom.kind(&fragment), NodeKind::Fragment);
	assert_eq!(dom.child_count(&fragment), 2);

	dom.append_child(&body, &fragment).unwrap();

	assert_eq!(dom.inner_html(body), "x<b></b>");
	assert_eq!(dom.child_count(&fragment), 0);
}

#[test]
fn element_children_fragments() {
	let (dom, mut reconciler, body) = setup();

	let list = |keys: Vec<&'static str>| V::element("ul").child(V::fragment(keys.into_iter().map(item))).build();

	reconciler.reconcile(&body, &list(vec!["a", "b", "c"])).unwrap();
	reconciler.reconcile(&body, &list(vec!["c", "a"])).unwrap();

	assert_eq!(dom.inner_html(body), r#"<ul><li data-key="c">c</li><li data-key="a">a</li></ul>"#);
}
