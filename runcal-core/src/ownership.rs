//! Event ownership filter.
//!
//! The sole authority for "may this event be updated or deleted". Any event
//! failing this test must never be mutated, regardless of date match.

use crate::event::RemoteEvent;

/// Returns true iff the event's description contains the ownership marker.
/// A missing description means the event is foreign.
pub fn is_managed(event: &RemoteEvent, marker: &str) -> bool {
    event
        .description
        .as_deref()
        .map(|desc| desc.contains(marker))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Managed by runcal";

    fn event_with_description(desc: Option<&str>) -> RemoteEvent {
        RemoteEvent {
            id: "e1".to_string(),
            description: desc.map(str::to_string),
            start: None,
        }
    }

    #[test]
    fn test_marker_anywhere_in_description_is_managed() {
        let event = event_with_description(Some("Managed by runcal\n8K Route: Canal Loop"));
        assert!(is_managed(&event, MARKER));

        let event = event_with_description(Some("some preamble\nManaged by runcal"));
        assert!(is_managed(&event, MARKER));
    }

    #[test]
    fn test_foreign_description_is_not_managed() {
        let event = event_with_description(Some("Book club meeting"));
        assert!(!is_managed(&event, MARKER));
    }

    #[test]
    fn test_missing_description_is_not_managed() {
        let event = event_with_description(None);
        assert!(!is_managed(&event, MARKER));
    }
}
