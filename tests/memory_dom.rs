use reconcile_dom::{
	dom::NodeKind,
	memory::{MemoryDom, MemoryDomError, NodeId},
	Dom as _,
};

mod harness_;
use harness_::init_logging;

fn element(dom: &MemoryDom, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
	let element = dom.create_element(tag, None, None).unwrap();
	for (name, value) in attributes {
		dom.set_attribute(&element, name, value).unwrap();
	}
	element
}

#[test]
fn skeleton() {
	init_logging();
	let dom = MemoryDom::new();

	assert_eq!(dom.outer_html(dom.document()), "<html><body></body></html>");
	assert_eq!(dom.kind(&dom.document()), NodeKind::Other);
	assert!(dom.is_connected(dom.body()));
}

#[test]
fn selectors() {
	init_logging();
	let dom = MemoryDom::new();
	let list = element(&dom, "ul", &[("id", "menu")]);
	let first = element(&dom, "li", &[("class", "item first")]);
	let second = element(&dom, "li", &[("class", "item")]);
	dom.append_child(&list, &first).unwrap();
	dom.append_child(&list, &second).unwrap();
	dom.append_child(&dom.body(), &list).unwrap();

	assert_eq!(dom.query_selector("#menu"), Some(list));
	assert_eq!(dom.query_selector("ul li"), Some(first));
	assert_eq!(dom.query_selector("li.item"), Some(first));
	assert_eq!(dom.query_selector("#menu .item:not-supported"), None);
	assert_eq!(dom.query_selector("body *"), Some(list));
	assert_eq!(dom.query_selector("ol li"), None);
	assert_eq!(dom.query_selector("  "), None);
}

#[test]
fn serialization_escapes() {
	init_logging();
	let dom = MemoryDom::new();
	let p = element(&dom, "p", &[("title", r#"say "a & b""#)]);
	let text = dom.create_text("1 < 2 & 3 > 2").unwrap();
	dom.append_child(&p, &text).unwrap();

	assert_eq!(dom.outer_html(p), r#"<p title="say &quot;a &amp; b&quot;">1 &lt; 2 &amp; 3 &gt; 2</p>"#);
}

#[test]
fn void_elements() {
	init_logging();
	let dom = MemoryDom::new();
	let input = element(&dom, "input", &[("type", "text")]);

	assert_eq!(dom.outer_html(input), r#"<input type="text">"#);
}

#[test]
fn fragments_are_spliced() {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	let last = element(&dom, "hr", &[]);
	dom.append_child(&body, &last).unwrap();

	let fragment = dom.create_fragment().unwrap();
	for text in &["a", "b"] {
		let text = dom.create_text(text).unwrap();
		dom.append_child(&fragment, &text).unwrap();
	}
	dom.insert_before(&body, &fragment, Some(&last)).unwrap();

	assert_eq!(dom.inner_html(body), "ab<hr>");
	assert_eq!(dom.child_count(&fragment), 0);
}

#[test]
fn mutation_errors() {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	let stray = dom.create_text("stray").unwrap();

	assert!(matches!(dom.remove_child(&body, &stray), Err(MemoryDomError::NotAChild)));
	assert!(matches!(dom.insert_before(&body, &stray, Some(&stray)), Ok(())));
	let reference = dom.create_text("reference").unwrap();
	assert!(matches!(dom.insert_before(&body, &stray, Some(&reference)), Err(MemoryDomError::NotAChild)));
	assert!(matches!(dom.set_attribute(&stray, "title", "x"), Err(MemoryDomError::NotAnElement)));
	assert!(matches!(dom.set_inner_html(&stray, "<b></b>"), Err(MemoryDomError::NotAnElement)));
	assert!(matches!(
		dom.append_child(&body, &dom.document()),
		Err(MemoryDomError::Tree(_))
	));
}

#[test]
fn detached_nodes() {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	let p = element(&dom, "p", &[]);

	assert!(!dom.is_connected(p));
	dom.append_child(&body, &p).unwrap();
	assert!(dom.is_connected(p));
	dom.remove_child(&body, &p).unwrap();
	assert!(!dom.is_connected(p));
	assert_eq!(dom.parent(p), None);
}

#[test]
fn inner_html_is_parsed() {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	dom.set_inner_html(&body, r#"<ul id="menu"><li class="item">one</li><!-- gap --><li class="item last">two &amp; three</li></ul>"#)
		.unwrap();

	let list = dom.query_selector("#menu").unwrap();
	assert_eq!(dom.child_count(&list), 3);
	assert_eq!(dom.text_content(list), "onetwo & three");
	assert_eq!(dom.query_selector("li.last").map(|item| dom.text_content(item)).as_deref(), Some("two & three"));
	assert_eq!(
		dom.inner_html(body),
		r#"<ul id="menu"><li class="item">one</li><!-- gap --><li class="item last">two &amp; three</li></ul>"#
	);
}

#[test]
fn inner_html_replaces_and_frees_children() {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	let old = element(&dom, "p", &[]);
	dom.append_child(&body, &old).unwrap();

	dom.set_inner_html(&body, "<b>new</b>").unwrap();

	assert!(!dom.is_connected(old));
	assert_eq!(dom.outer_html(old), "");
	assert_eq!(dom.child_count(&old), 0);
	assert_eq!(dom.inner_html(body), "<b>new</b>");
}

#[test]
fn structural_and_attribute_selectors() {
	init_logging();
	let dom = MemoryDom::new();
	dom.set_inner_html(&dom.body(), r#"<a href="/">home</a><a>plain</a><p lang="en-GB"></p><p></p>"#).unwrap();
	let body = dom.body();

	assert_eq!(dom.query_selector("a:not([href])"), dom.child_at(&body, 1));
	assert_eq!(dom.query_selector("[lang|=en]"), dom.child_at(&body, 2));
	assert_eq!(dom.query_selector("p:last-child"), dom.child_at(&body, 3));
	assert_eq!(dom.query_selector("body > a + a"), dom.child_at(&body, 1));
	assert_eq!(dom.query_selector("p:empty"), dom.child_at(&body, 2));
	assert_eq!(dom.query_selector("a:hover"), None);
}

#[test]
fn released_nodes_are_freed() {
	init_logging();
	let dom = MemoryDom::new();
	let body = dom.body();
	let p = element(&dom, "p", &[]);
	dom.append_child(&body, &p).unwrap();

	dom.release(&p);
	assert!(dom.is_connected(p));

	dom.remove_child(&body, &p).unwrap();
	dom.release(&p);
	assert_eq!(dom.kind(&p), NodeKind::Other);
	assert_eq!(dom.root_node(&p), p);
	assert!(!dom.is_connected(p));
}
