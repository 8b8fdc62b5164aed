//! CBOR encoding shared by action payloads and account snapshots.
//!
//! Actions are stored as CBOR bytes inside the proposal and decoded by the
//! type the draining module asks for. Snapshots use the same encoding, and
//! fields added later carry `#[serde(default)]` so older snapshots load.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    #[error("CBOR decoding failed: {0}")]
    Decode(String),
}

/// Encode an action payload or snapshot.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|e| SerializationError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Decode bytes as `T`. Types with checked decoding report their invariant
/// violations here.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::registry::{Member, RegistryRules};
    use serde::Deserialize;

    fn rules() -> RegistryRules {
        RegistryRules::default()
            .member(Address::new([1; 32]), 2, ["treasurer"])
            .member(Address::new([2; 32]), 3, Vec::<String>::new())
            .global(4)
            .role("treasurer", 2)
    }

    #[test]
    fn test_rules_payload_encodes_identically() {
        let first = to_cbor(&rules()).unwrap();
        assert_eq!(to_cbor(&rules()).unwrap(), first);
        assert_eq!(from_cbor::<RegistryRules>(&first).unwrap(), rules());
    }

    #[test]
    fn test_payload_decoded_as_other_action_fails() {
        let bytes = to_cbor(&rules()).unwrap();
        let result: Result<Member, _> = from_cbor(&bytes);
        assert!(matches!(result, Err(SerializationError::Decode(_))));
    }

    #[test]
    fn test_member_saved_before_profiles_loads() {
        #[derive(Serialize, Deserialize)]
        struct MemberBeforeProfiles {
            address: Address,
            weight: u64,
            roles: Vec<String>,
        }

        let bytes = to_cbor(&MemberBeforeProfiles {
            address: Address::new([7; 32]),
            weight: 5,
            roles: vec!["ops".to_string()],
        })
        .unwrap();

        let member: Member = from_cbor(&bytes).unwrap();
        assert_eq!(member, Member::new(Address::new([7; 32]), 5, ["ops"]));
        assert_eq!(member.profile, None);
    }
}
