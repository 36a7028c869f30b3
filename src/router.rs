//! Message routing
//!
//! Decides the delivery set for each message class and hands the event to
//! every target's connection handle:
//!
//! - join announcement: everyone except the joiner
//! - room broadcast: everyone, sender included
//! - private message: the single session resolved by name
//!
//! Fan-out iterates a registry snapshot in connection order.

use tracing::debug;

use crate::error::AppError;
use crate::message::ServerEvent;
use crate::registry::UserRegistry;
use crate::session::Session;
use crate::types::SessionId;

/// Announce a newly named session to every other connected session
///
/// Returns the number of sessions the announcement was handed to.
pub fn announce_join(registry: &UserRegistry, joiner: SessionId, name: &str) -> usize {
    let event = ServerEvent::joined(name);
    registry
        .all_sessions()
        .iter()
        .filter(|session| session.id != joiner)
        .filter(|session| deliver(session, event.clone()))
        .count()
}

/// Send text to every connected session, the sender included
pub fn broadcast(registry: &UserRegistry, text: &str) -> usize {
    let event = ServerEvent::Message(text.to_string());
    registry
        .all_sessions()
        .iter()
        .filter(|session| deliver(session, event.clone()))
        .count()
}

/// Deliver text to the session bound to `to`
///
/// Exactly one event is sent when the recipient exists. Fails with
/// `UnknownRecipient` otherwise; nothing is sent to anyone in that case.
pub fn private_message(
    registry: &UserRegistry,
    sender: SessionId,
    to: &str,
    txt: String,
) -> Result<(), AppError> {
    let recipient = registry
        .find_by_name(to)
        .ok_or_else(|| AppError::UnknownRecipient(to.to_string()))?;

    let from = registry.get(sender).and_then(|s| s.name.clone());
    deliver(recipient, ServerEvent::PrivateMessage { txt, from });
    Ok(())
}

/// Hand one event to a session, logging if its connection is already gone
fn deliver(session: &Session, event: ServerEvent) -> bool {
    let event_name = event.event_name();
    match session.send(event) {
        Ok(()) => true,
        Err(e) => {
            debug!(
                "Dropping '{}' for session {} ({}): {}",
                event_name,
                session.id,
                session.display_name(),
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::session::ConnectionHandle;

    fn connect(registry: &mut UserRegistry) -> (SessionId, UnboundedReceiver<ServerEvent>) {
        let (handle, rx) = ConnectionHandle::channel();
        (registry.register(handle), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_join_excludes_joiner() {
        let mut registry = UserRegistry::default();
        let (tom, mut tom_rx) = connect(&mut registry);
        let (_unnamed, mut unnamed_rx) = connect(&mut registry);
        let (sally, mut sally_rx) = connect(&mut registry);

        registry.bind(tom, "Tom".to_string()).unwrap();
        registry.bind(sally, "Sally".to_string()).unwrap();
        let delivered = announce_join(&registry, sally, "Sally");

        assert_eq!(delivered, 2);
        assert_eq!(drain(&mut tom_rx), vec![ServerEvent::joined("Sally")]);
        assert_eq!(drain(&mut unnamed_rx), vec![ServerEvent::joined("Sally")]);
        assert!(drain(&mut sally_rx).is_empty());
    }

    #[test]
    fn test_join_with_nobody_else_online() {
        let mut registry = UserRegistry::default();
        let (tom, mut tom_rx) = connect(&mut registry);

        assert_eq!(announce_join(&registry, tom, "Tom"), 0);
        assert!(drain(&mut tom_rx).is_empty());
    }

    #[test]
    fn test_broadcast_includes_sender() {
        let mut registry = UserRegistry::default();
        let mut receivers: Vec<_> = (0..3).map(|_| connect(&mut registry).1).collect();

        assert_eq!(broadcast(&registry, "Hello World"), 3);

        for rx in receivers.iter_mut() {
            assert_eq!(
                drain(rx),
                vec![ServerEvent::Message("Hello World".to_string())]
            );
        }
    }

    #[test]
    fn test_broadcast_skips_closed_connections() {
        let mut registry = UserRegistry::default();
        let (_gone, gone_rx) = connect(&mut registry);
        let (_alive, mut alive_rx) = connect(&mut registry);
        drop(gone_rx);

        assert_eq!(broadcast(&registry, "still here"), 1);
        assert_eq!(drain(&mut alive_rx).len(), 1);
    }

    #[test]
    fn test_private_message_reaches_only_recipient() {
        let mut registry = UserRegistry::default();
        let (tom, mut tom_rx) = connect(&mut registry);
        let (sally, mut sally_rx) = connect(&mut registry);
        let (dana, mut dana_rx) = connect(&mut registry);
        registry.bind(tom, "Tom".to_string()).unwrap();
        registry.bind(sally, "Sally".to_string()).unwrap();
        registry.bind(dana, "Dana".to_string()).unwrap();

        private_message(&registry, dana, "Tom", "Private Hello World".to_string()).unwrap();

        assert_eq!(
            drain(&mut tom_rx),
            vec![ServerEvent::PrivateMessage {
                txt: "Private Hello World".to_string(),
                from: Some("Dana".to_string()),
            }]
        );
        assert!(drain(&mut sally_rx).is_empty());
        assert!(drain(&mut dana_rx).is_empty());
    }

    #[test]
    fn test_private_message_from_unnamed_sender() {
        let mut registry = UserRegistry::default();
        let (tom, mut tom_rx) = connect(&mut registry);
        let (anon, _anon_rx) = connect(&mut registry);
        registry.bind(tom, "Tom".to_string()).unwrap();

        private_message(&registry, anon, "Tom", "who am I".to_string()).unwrap();

        assert_eq!(
            drain(&mut tom_rx),
            vec![ServerEvent::PrivateMessage {
                txt: "who am I".to_string(),
                from: None,
            }]
        );
    }

    #[test]
    fn test_private_message_unknown_recipient() {
        let mut registry = UserRegistry::default();
        let (tom, mut tom_rx) = connect(&mut registry);
        let (dana, mut dana_rx) = connect(&mut registry);
        registry.bind(tom, "Tom".to_string()).unwrap();
        registry.bind(dana, "Dana".to_string()).unwrap();

        let result = private_message(&registry, dana, "Nobody", "hello?".to_string());

        assert!(matches!(result, Err(AppError::UnknownRecipient(name)) if name == "Nobody"));
        assert!(drain(&mut tom_rx).is_empty());
        assert!(drain(&mut dana_rx).is_empty());
    }

    #[test]
    fn test_private_message_duplicate_name_delivers_once() {
        let mut registry = UserRegistry::default();
        let (first, mut first_rx) = connect(&mut registry);
        let (second, mut second_rx) = connect(&mut registry);
        let (dana, _dana_rx) = connect(&mut registry);
        registry.bind(first, "Tom".to_string()).unwrap();
        registry.bind(second, "Tom".to_string()).unwrap();

        private_message(&registry, dana, "Tom", "which one".to_string()).unwrap();

        assert_eq!(drain(&mut first_rx).len(), 1);
        assert!(drain(&mut second_rx).is_empty());
    }
}
