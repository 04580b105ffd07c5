use reconcile_dom::{
	memory::{MemoryDom, MemoryDomError},
	Dom as _, Error, Options, Reconciler,
};

mod harness_;
use harness_::{init_logging, setup, V};

fn nested(levels: usize) -> V {
	let mut element = V::element("div");
	for _ in 1..levels {
		element = V::element("div").child(element);
	}
	element.build()
}

fn limited(depth_limit: usize) -> (MemoryDom, Reconciler<MemoryDom>) {
	init_logging();
	let dom = MemoryDom::new();
	let reconciler = Reconciler::with_options(dom.clone(), Options::new().depth_limit(depth_limit));
	(dom, reconciler)
}

#[test]
fn missing_mount_target() {
	let (dom, mut reconciler, body) = setup();

	match reconciler.reconcile_selector("#missing", &V::element("p").build()) {
		Err(Error::MountTargetNotFound { selector }) => assert_eq!(selector, "#missing"),
		other => panic!("expected `MountTargetNotFound`, got {:?}", other),
	}
	assert_eq!(dom.inner_html(body), "");
}

#[test]
fn mount_by_selector() {
	let (dom, mut reconciler, body) = setup();

	reconciler.reconcile(&body, &V::element("div").attr("id", "app").build()).unwrap();
	reconciler.reconcile_selector("#app", &V::element("p").child("mounted").build()).unwrap();
	reconciler.reconcile_selector("body div#app", &V::element("p").child("again").build()).unwrap();

	assert_eq!(dom.inner_html(body), r#"<div id="app"><p>again</p></div>"#);
}

#[test]
fn invalid_tags() {
	let (dom, mut reconciler, body) = setup();

	for tag in &["", "two words"] {
		match reconciler.reconcile(&body, &V::element(*tag).build()) {
			Err(Error::InvalidVNode { .. }) => (),
			other => panic!("expected `InvalidVNode` for {:?}, got {:?}", tag, other),
		}
	}
	assert_eq!(dom.child_count(&body), 0);
}

#[test]
fn depth_limit_allows_exactly_that_many_levels() {
	let (dom, mut reconciler) = limited(3);
	let body = dom.body();

	reconciler.reconcile(&body, &nested(3)).unwrap();
	// Updating must not need more headroom than creating.
	reconciler.reconcile(&body, &nested(3)).unwrap();

	match reconciler.reconcile(&body, &nested(4)) {
		Err(Error::DepthLimitReached { limit }) => assert_eq!(limit, 3),
		other => panic!("expected `DepthLimitReached`, got {:?}", other),
	}
}

#[test]
fn failures_are_not_rolled_back() {
	let (dom, mut reconciler) = limited(2);
	let body = dom.body();

	let result = reconciler.reconcile(&body, &[V::element("p").child("kept").build(), nested(3)]);

	assert!(matches!(result, Err(Error::DepthLimitReached { limit: 2 })));
	assert_eq!(dom.child_at(&body, 0).map(|p| dom.outer_html(p)).as_deref(), Some("<p>kept</p>"));
}

#[test]
fn messages() {
	let cases: Vec<(Error<MemoryDomError>, &str)> = vec![
		(
			Error::InvalidVNode {
				reason: "element descriptor has an empty tag",
			},
			"invalid virtual node: element descriptor has an empty tag",
		),
		(
			Error::MountTargetNotFound { selector: "#app".to_owned() },
			r##"no mount target matches "#app""##,
		),
		(Error::DepthLimitReached { limit: 512 }, "depth limit (512) reached"),
		(Error::NotAnElement, "expected an element"),
		(Error::Dom(MemoryDomError::NotAChild), "DOM operation failed: node is not a child of the given parent"),
	];

	for (error, message) in cases {
		assert_eq!(error.to_string(), message);
	}
}
