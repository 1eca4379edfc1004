/// How a component responded to a key event.
///
/// Overlay components (pickers, the command palette) sit in front of their
/// owning view; the view feeds them every key first and uses this result to
/// decide whether the key is still its to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed with an event the owner must act on.
  Event(T),
  /// Consumed silently (internal navigation or editing).
  Handled,
  /// Not consumed; the owner should handle the key itself.
  NotHandled,
}
