//! `querySelector` matching through the `selectors` crate.

use super::{Data, ElementData};
use crate::dom::HTML_NAMESPACE;
use core::{
	borrow::Borrow,
	fmt::{self, Debug, Formatter, Write},
};
use cssparser::{Parser as CssParser, ParserInput, ToCss};
use indextree::{Arena, Node as ArenaNode, NodeId};
use precomputed_hash::PrecomputedHash;
use selectors::{
	attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint},
	matching::{matches_selector, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode, NeedsSelectorFlags, QuirksMode},
	parser::{ParseRelative, SelectorList, SelectorParseErrorKind},
	NthIndexCache, OpaqueElement,
};
use tracing::trace;

/// Parses a selector list. [`None`] if it's invalid or uses pseudo-classes other than the structural ones.
pub(super) fn parse(selector: &str) -> Option<SelectorList<Selectors>> {
	let mut input = ParserInput::new(selector);
	let mut parser = CssParser::new(&mut input);
	match SelectorList::parse(&SelectorParser, &mut parser, ParseRelative::No) {
		Ok(list) => Some(list),
		Err(error) => {
			trace!(?error, "Unsupported selector.");
			None
		}
	}
}

/// The first element below `root` in tree order that matches any of `list`.
pub(super) fn first_match(arena: &Arena<Data>, root: NodeId, list: &SelectorList<Selectors>) -> Option<NodeId> {
	let mut nth_index_cache = NthIndexCache::default();
	let mut context = MatchingContext::new(
		MatchingMode::Normal,
		None,
		&mut nth_index_cache,
		QuirksMode::NoQuirks,
		NeedsSelectorFlags::No,
		IgnoreNthChildForInvalidation::No,
	);
	let found = root.descendants(arena).skip(1).find(|&node| {
		ArenaElement::new(arena, node).map_or(false, |element| {
			list.0.iter().any(|selector| matches_selector(selector, 0, None, &element, &mut context))
		})
	});
	found
}

/// Identifiers, attribute values and namespace URLs alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CssString(String);

impl From<&str> for CssString {
	fn from(string: &str) -> Self {
		Self(string.to_owned())
	}
}

impl Borrow<str> for CssString {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for CssString {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl ToCss for CssString {
	fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
		cssparser::serialize_string(&self.0, dest)
	}
}

impl PrecomputedHash for CssString {
	fn precomputed_hash(&self) -> u32 {
		// FNV-1a
		self.0.bytes().fold(0x811c_9dc5, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193))
	}
}

#[derive(Debug, Clone, Copy)]
pub struct Selectors;

impl selectors::SelectorImpl for Selectors {
	type ExtraMatchingData<'a> = ();
	type AttrValue = CssString;
	type Identifier = CssString;
	type LocalName = CssString;
	type NamespacePrefix = CssString;
	type NamespaceUrl = CssString;
	type BorrowedLocalName = str;
	type BorrowedNamespaceUrl = str;
	type NonTSPseudoClass = PseudoClass;
	type PseudoElement = PseudoElement;
}

/// Neither user action nor link state exists here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {}

impl selectors::parser::NonTSPseudoClass for PseudoClass {
	type Impl = Selectors;

	fn is_active_or_hover(&self) -> bool {
		match *self {}
	}

	fn is_user_action_state(&self) -> bool {
		match *self {}
	}
}

impl ToCss for PseudoClass {
	fn to_css<W: Write>(&self, _dest: &mut W) -> fmt::Result {
		match *self {}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl selectors::parser::PseudoElement for PseudoElement {
	type Impl = Selectors;
}

impl ToCss for PseudoElement {
	fn to_css<W: Write>(&self, _dest: &mut W) -> fmt::Result {
		match *self {}
	}
}

struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
	type Impl = Selectors;
	type Error = SelectorParseErrorKind<'i>;
}

#[derive(Clone)]
struct ArenaElement<'a> {
	arena: &'a Arena<Data>,
	node: NodeId,
	data: &'a ElementData,
}

impl<'a> ArenaElement<'a> {
	fn new(arena: &'a Arena<Data>, node: NodeId) -> Option<Self> {
		match arena.get(node).map(ArenaNode::get) {
			Some(Data::Element(data)) => Some(Self { arena, node, data }),
			_ => None,
		}
	}

	fn first_element(&self, mut nodes: impl Iterator<Item = NodeId>) -> Option<Self> {
		nodes.find_map(|node| Self::new(self.arena, node))
	}
}

impl Debug for ArenaElement<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ArenaElement").field("node", &self.node).field("tag", &self.data.tag).finish()
	}
}

impl selectors::Element for ArenaElement<'_> {
	type Impl = Selectors;

	fn opaque(&self) -> OpaqueElement {
		OpaqueElement::new(self.data)
	}

	fn parent_element(&self) -> Option<Self> {
		self.first_element(self.arena.get(self.node).and_then(ArenaNode::parent).into_iter())
	}

	fn parent_node_is_shadow_root(&self) -> bool {
		false
	}

	fn containing_shadow_host(&self) -> Option<Self> {
		None
	}

	fn is_pseudo_element(&self) -> bool {
		false
	}

	fn prev_sibling_element(&self) -> Option<Self> {
		self.first_element(self.node.preceding_siblings(self.arena).skip(1))
	}

	fn next_sibling_element(&self) -> Option<Self> {
		self.first_element(self.node.following_siblings(self.arena).skip(1))
	}

	fn first_element_child(&self) -> Option<Self> {
		self.first_element(self.node.children(self.arena))
	}

	fn is_html_element_in_html_document(&self) -> bool {
		self.data.namespace == HTML_NAMESPACE
	}

	fn has_local_name(&self, local_name: &str) -> bool {
		self.data.tag == local_name
	}

	fn has_namespace(&self, namespace: &str) -> bool {
		self.data.namespace == namespace
	}

	fn is_same_type(&self, other: &Self) -> bool {
		self.data.tag == other.data.tag && self.data.namespace == other.data.namespace
	}

	fn attr_matches(&self, namespace: &NamespaceConstraint<&CssString>, local_name: &CssString, operation: &AttrSelectorOperation<&CssString>) -> bool {
		// Attributes are never namespaced here.
		if let NamespaceConstraint::Specific(namespace) = namespace {
			if !namespace.0.is_empty() {
				return false;
			}
		}
		self.data.attribute(&local_name.0).map_or(false, |value| operation.eval_str(value))
	}

	fn match_non_ts_pseudo_class(&self, pseudo_class: &PseudoClass, _context: &mut MatchingContext<Selectors>) -> bool {
		match *pseudo_class {}
	}

	fn match_pseudo_element(&self, pseudo_element: &PseudoElement, _context: &mut MatchingContext<Selectors>) -> bool {
		match *pseudo_element {}
	}

	fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

	fn is_link(&self) -> bool {
		matches!(self.data.tag.as_str(), "a" | "area") && self.data.attribute("href").is_some()
	}

	fn is_html_slot_element(&self) -> bool {
		self.is_html_element_in_html_document() && self.data.tag == "slot"
	}

	fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
		self.data.attribute("id").map_or(false, |value| case_sensitivity.eq(value.as_bytes(), id.0.as_bytes()))
	}

	fn has_class(&self, name: &CssString, case_sensitivity: CaseSensitivity) -> bool {
		self.data
			.attribute("class")
			.map_or(false, |classes| classes.split_ascii_whitespace().any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes())))
	}

	fn imported_part(&self, _name: &CssString) -> Option<CssString> {
		None
	}

	fn is_part(&self, _name: &CssString) -> bool {
		false
	}

	fn is_empty(&self) -> bool {
		self.node.children(self.arena).all(|child| match self.arena.get(child).map(ArenaNode::get) {
			Some(Data::Element(_)) => false,
			Some(Data::Text(text)) => text.is_empty(),
			_ => true,
		})
	}

	fn is_root(&self) -> bool {
		let parent = self.arena.get(self.node).and_then(ArenaNode::parent);
		matches!(parent.and_then(|parent| self.arena.get(parent)).map(ArenaNode::get), Some(Data::Document))
	}
}
