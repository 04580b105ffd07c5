use reconcile_dom::{
	memory::{ElementDefinition, MemoryDom},
	Dom as _, Error, PropValue, Props,
};
use std::rc::Rc;

mod harness_;
use harness_::{setup, V};

#[test]
fn typed_properties_are_not_attributes() {
	let (dom, mut reconciler, body) = setup();

	reconciler.reconcile(&body, &V::element("input").attr("value", "typed").prop("checked", true).build()).unwrap();
	let input = dom.child_at(&body, 0).unwrap();

	assert_eq!(dom.get_attribute(input, "value"), None);
	assert_eq!(dom.property(input, "value"), Some(PropValue::String("typed".to_owned())));
	assert_eq!(dom.property(input, "checked"), Some(PropValue::Boolean(true)));
}

#[test]
fn reflected_properties() {
	let (dom, mut reconciler, body) = setup();

	reconciler
		.reconcile(&body, &V::element("div").attr("id", "main").attr("className", "a b").prop("hidden", true).build())
		.unwrap();
	let div = dom.child_at(&body, 0).unwrap();
	assert_eq!(dom.outer_html(div), r#"<div id="main" class="a b" hidden=""></div>"#);

	reconciler.reconcile(&body, &V::element("div").attr("id", "main").prop("hidden", false).build()).unwrap();
	assert_eq!(dom.outer_html(div), r#"<div id="main"></div>"#);
}

#[test]
fn attribute_changes_and_removal() {
	let (dom, mut reconciler, body) = setup();

	reconciler
		.reconcile(&body, &V::element("a").attr("href", "/one").attr("class", "link").build())
		.unwrap();
	let a = dom.child_at(&body, 0).unwrap();

	reconciler.reconcile(&body, &V::element("a").attr("href", "/two").build()).unwrap();

	assert_eq!(dom.get_attribute(a, "href").as_deref(), Some("/two"));
	assert_eq!(dom.get_attribute(a, "class"), None);
}

#[test]
fn non_strings_fall_back_to_properties() {
	let (dom, mut reconciler, body) = setup();
	let payload: Rc<dyn std::any::Any> = Rc::new(vec![1, 2, 3]);

	reconciler
		.reconcile(
			&body,
			&V::element("div").prop("count", 3).prop("payload", PropValue::Object(payload.clone())).build(),
		)
		.unwrap();
	let div = dom.child_at(&body, 0).unwrap();

	assert_eq!(dom.get_attribute(div, "count"), None);
	assert_eq!(dom.property(div, "count"), Some(PropValue::Number(3.0)));
	assert_eq!(dom.property(div, "payload"), Some(PropValue::Object(payload)));

	reconciler.reconcile(&body, &V::element("div").build()).unwrap();
	assert_eq!(dom.property(div, "count"), None);
	assert_eq!(dom.property(div, "payload"), None);
}

#[test]
fn text_content_property() {
	let (dom, mut reconciler, body) = setup();

	reconciler.reconcile(&body, &V::element("p").prop("textContent", "from a property").build()).unwrap();
	let p = dom.child_at(&body, 0).unwrap();

	assert_eq!(dom.text_content(p), "from a property");
}

#[test]
fn custom_element_properties() {
	let (dom, mut reconciler, body) = setup();
	assert!(dom.define_element("x-list", ElementDefinition::new().property("items").property("label")));
	assert!(!dom.define_element("x-list", ElementDefinition::new()));

	reconciler
		.reconcile(&body, &V::element("x-list").attr("label", "Fruit").prop("items", 3).build())
		.unwrap();
	let list = dom.child_at(&body, 0).unwrap();

	// Feature-detected: a string goes to the property, not the attribute.
	assert_eq!(dom.property(list, "label"), Some(PropValue::String("Fruit".to_owned())));
	assert_eq!(dom.get_attribute(list, "label"), None);
	assert_eq!(dom.property(list, "items"), Some(PropValue::Number(3.0)));
}

#[test]
fn customized_builtin_elements() {
	let (dom, mut reconciler, body) = setup();
	dom.define_element("fancy-button", ElementDefinition::new().property("fancy"));

	reconciler
		.reconcile(&body, &V::element("button").attr("is", "fancy-button").attr("fancy", "yes").build())
		.unwrap();
	let button = dom.child_at(&body, 0).unwrap();

	assert_eq!(dom.property(button, "fancy"), Some(PropValue::String("yes".to_owned())));
	assert_eq!(dom.render_count(button), 1);
}

#[test]
fn reserved_names_are_skipped() {
	let (dom, mut reconciler, body) = setup();

	reconciler
		.reconcile(&body, &V::element("div").attr("key", "k").attr("ref", "r").attr("children", "c").build())
		.unwrap();
	let div = dom.child_at(&body, 0).unwrap();

	assert!(dom.attributes(&div).is_empty());
}

#[test]
fn sync_properties_directly() {
	let (dom, mut reconciler, _) = setup();
	let element = dom.create_element("div", None, None).unwrap();

	let mut old = Props::<MemoryDom>::new();
	old.insert("title", "old".into());
	old.insert("class", "gone".into());
	reconciler.sync_properties(&element, &old, &Props::new()).unwrap();
	assert_eq!(dom.outer_html(element), r#"<div title="old" class="gone"></div>"#);

	let mut new = Props::new();
	new.insert("title", "new".into());
	reconciler.sync_properties(&element, &new, &old).unwrap();
	assert_eq!(dom.outer_html(element), r#"<div title="new"></div>"#);

	// Applying the same delta again changes nothing.
	reconciler.sync_properties(&element, &new, &old).unwrap();
	assert_eq!(dom.outer_html(element), r#"<div title="new"></div>"#);
}

#[test]
fn sync_properties_rejects_text() {
	let (dom, mut reconciler, _) = setup();
	let text = dom.create_text("not an element").unwrap();

	match reconciler.sync_properties(&text, &Props::new(), &Props::new()) {
		Err(Error::NotAnElement) => (),
		other => panic!("expected `NotAnElement`, got {:?}", other),
	}
}

#[test]
fn self_rendered_content_survives_updates() {
	let (dom, mut reconciler, body) = setup();
	dom.define_element(
		"my-element",
		ElementDefinition::new().property("value").on_render(|dom: &MemoryDom, element| {
			let title = dom.get_attribute(element, "title").unwrap_or_default();
			let value = match dom.property(element, "value") {
				Some(PropValue::Number(value)) => value.to_string(),
				_ => String::new(),
			};
			let text = format!("Title: {}, Value: {}", title, value);
			dom.set_property(&element, "textContent", &PropValue::String(text)).unwrap();
		}),
	);

	reconciler.reconcile(&body, &V::element("my-element").attr("title", "Test Title").prop("value", 42).build()).unwrap();
	let element = dom.child_at(&body, 0).unwrap();
	assert_eq!(dom.text_content(element), "Title: Test Title, Value: 42");

	reconciler.reconcile(&body, &V::element("my-element").attr("title", "Updated Title").prop("value", 100).build()).unwrap();
	assert_eq!(dom.child_at(&body, 0), Some(element));
	assert_eq!(dom.text_content(element), "Title: Updated Title, Value: 100");
}

#[test]
fn empty_child_list_still_clears() {
	let (dom, mut reconciler, body) = setup();

	reconciler.reconcile(&body, &V::element("div").child("content").build()).unwrap();
	let div = dom.child_at(&body, 0).unwrap();

	reconciler.reconcile(&body, &V::element("div").build()).unwrap();
	assert_eq!(dom.inner_html(div), "content");

	reconciler.reconcile(&body, &V::element("div").children(Vec::<V>::new()).build()).unwrap();
	assert_eq!(dom.inner_html(div), "");
}
