#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use crate::frames::{decode_frame, InboundFrame};
    use crate::identity::UserIdentity;

    // Any four colon-free fields survive the payload format.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_identity_fields_preserved(
            id in "[0-9]{1,20}",
            discriminator in "[0-9]{1,4}",
            avatar in "[a-f0-9]{32}",
            username in "[^:]{1,32}",
        ) {
            let payload = format!("{id}:{discriminator}:{avatar}:{username}");
            let identity = UserIdentity::parse(&payload).unwrap();
            prop_assert_eq!(identity.id, id);
            prop_assert_eq!(identity.discriminator, discriminator);
            prop_assert_eq!(identity.avatar, avatar);
            prop_assert_eq!(identity.username, username);
        }

        #[test]
        fn prop_identity_rejects_wrong_arity(parts in prop::collection::vec("[^:]{0,8}", 0..10usize)) {
            prop_assume!(parts.len() != 4);
            let payload = parts.join(":");
            // An empty vec joins to "", which still splits into one field.
            prop_assert!(UserIdentity::parse(&payload).is_err());
        }

        #[test]
        fn prop_pending_login_ticket_preserved(ticket in "\\PC{0,64}") {
            let text = json!({"op": "pending_login", "ticket": ticket.clone()}).to_string();
            let raw = decode_frame(&text).unwrap();
            prop_assert_eq!(InboundFrame::from_raw(&raw).unwrap(), InboundFrame::PendingLogin { ticket });
        }

        #[test]
        fn prop_arbitrary_text_never_panics(text in "\\PC*") {
            if let Ok(raw) = decode_frame(&text) {
                let _ = InboundFrame::from_raw(&raw);
            }
        }
    }
}
