//! User record revealed by `pending_ticket`.

use serde::{Deserialize, Serialize};

use crate::frames::FrameError;

/// Number of colon-separated fields in the decrypted user payload.
pub const IDENTITY_FIELDS: usize = 4;

/// Identity of the account that scanned the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Account snowflake
    pub id: String,
    /// Legacy four digit tag (`"0"` for migrated accounts)
    pub discriminator: String,
    /// Avatar hash as sent; `"0"` or empty for a default avatar
    pub avatar: String,
    /// Display name
    pub username: String,
}

impl UserIdentity {
    /// Parse `id:discriminator:avatar:username`.
    ///
    /// Exactly four fields are required; each is kept verbatim.
    pub fn parse(payload: &str) -> Result<Self, FrameError> {
        let fields: Vec<&str> = payload.split(':').collect();
        if fields.len() != IDENTITY_FIELDS {
            return Err(FrameError::Malformed {
                op: "pending_ticket".to_string(),
                reason: format!(
                    "user payload has {} fields, expected {}",
                    fields.len(),
                    IDENTITY_FIELDS
                ),
            });
        }

        Ok(Self {
            id: fields[0].to_string(),
            discriminator: fields[1].to_string(),
            avatar: fields[2].to_string(),
            username: fields[3].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identity() {
        let identity = UserIdentity::parse("42:7:abc:eve").unwrap();
        assert_eq!(identity.id, "42");
        assert_eq!(identity.discriminator, "7");
        assert_eq!(identity.avatar, "abc");
        assert_eq!(identity.username, "eve");
    }

    #[test]
    fn test_parse_identity_keeps_avatar_verbatim() {
        let identity = UserIdentity::parse("42:0:0:eve").unwrap();
        assert_eq!(identity.avatar, "0");

        let identity = UserIdentity::parse("42:0::eve").unwrap();
        assert_eq!(identity.avatar, "");
        assert_eq!(identity.username, "eve");
    }

    #[test]
    fn test_parse_identity_wrong_field_count() {
        assert!(UserIdentity::parse("42:7:abc").is_err());
        assert!(UserIdentity::parse("42:7:abc:eve:extra").is_err());
        assert!(UserIdentity::parse("").is_err());
    }
}
