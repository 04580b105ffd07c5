use std::borrow::Cow;

/// Reconciler configuration.
///
/// ```
/// use reconcile_dom::Options;
///
/// let options = Options::new().key_attribute("key").depth_limit(64);
/// assert_eq!(options.get_key_attribute(), "key");
/// ```
#[derive(Debug, Clone)]
pub struct Options {
	key_attribute: Cow<'static, str>,
	event_prefix: Cow<'static, str>,
	depth_limit: usize,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			key_attribute: Cow::Borrowed("data-key"),
			event_prefix: Cow::Borrowed("on"),
			depth_limit: 512,
		}
	}
}

impl Options {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Name of the visible attribute that mirrors an element's key. Defaults to `data-key`.
	#[must_use]
	pub fn key_attribute(mut self, key_attribute: impl Into<Cow<'static, str>>) -> Self {
		self.key_attribute = key_attribute.into();
		self
	}

	/// Prefix that marks a callable prop as an event listener. Defaults to `on`.
	#[must_use]
	pub fn event_prefix(mut self, event_prefix: impl Into<Cow<'static, str>>) -> Self {
		self.event_prefix = event_prefix.into();
		self
	}

	/// How deep the reconciler descends before failing. Defaults to 512.
	#[must_use]
	pub fn depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	#[must_use]
	pub fn get_key_attribute(&self) -> &str {
		&self.key_attribute
	}

	#[must_use]
	pub fn get_event_prefix(&self) -> &str {
		&self.event_prefix
	}

	#[must_use]
	pub fn get_depth_limit(&self) -> usize {
		self.depth_limit
	}

	/// The event name a prop binds to, if `prop_name` carries the event prefix.
	///
	/// `onClick` binds `click`.
	#[must_use]
	pub fn event_name(&self, prop_name: &str) -> Option<String> {
		prop_name
			.strip_prefix(&*self.event_prefix)
			.filter(|rest| !rest.is_empty())
			.map(str::to_ascii_lowercase)
	}
}
