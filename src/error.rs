use thiserror::Error;

/// Everything a reconciliation pass can fail with.
///
/// `E` is the host's [`Dom::Error`](`crate::Dom::Error`).
/// There is no rollback: mutations applied before the failure stay visible.
#[derive(Debug, Error)]
pub enum Error<E> {
	#[error("invalid virtual node: {reason}")]
	InvalidVNode { reason: &'static str },

	#[error("no mount target matches {selector:?}")]
	MountTargetNotFound { selector: String },

	#[error("depth limit ({limit}) reached")]
	DepthLimitReached { limit: usize },

	#[error("expected an element")]
	NotAnElement,

	#[error("DOM operation failed: {0}")]
	Dom(E),
}

impl<E> Error<E> {
	/// For use with [`Result::map_err`] on host calls.
	pub(crate) fn dom(error: E) -> Self {
		Self::Dom(error)
	}
}
