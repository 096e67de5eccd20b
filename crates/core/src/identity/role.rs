//! Role tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::IdentityError;

/// Marketplace participant kind.
///
/// Selects which of the four role detail stores holds an account's detail
/// record. The wire tags are the ones the marketplace has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    /// Farmer (`petani`).
    #[serde(rename = "petani")]
    Farmer,
    /// Logistics provider (`logistik`).
    #[serde(rename = "logistik")]
    Logistics,
    /// Factory (`pabrik`).
    #[serde(rename = "pabrik")]
    Factory,
    /// Company (`perusahaan`).
    #[serde(rename = "perusahaan")]
    Company,
}

impl RoleKind {
    /// Every role, in store order.
    pub const ALL: [Self; 4] = [Self::Farmer, Self::Logistics, Self::Factory, Self::Company];

    /// Canonical wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "petani",
            Self::Logistics => "logistik",
            Self::Factory => "pabrik",
            Self::Company => "perusahaan",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = IdentityError;

    /// Case-insensitive; English names are accepted as aliases.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "petani" | "farmer" => Ok(Self::Farmer),
            "logistik" | "logistics" => Ok(Self::Logistics),
            "pabrik" | "factory" => Ok(Self::Factory),
            "perusahaan" | "company" => Ok(Self::Company),
            _ => Err(IdentityError::UnknownRole(tag.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("petani", RoleKind::Farmer)]
    #[case("Petani", RoleKind::Farmer)]
    #[case("LOGISTIK", RoleKind::Logistics)]
    #[case(" pabrik ", RoleKind::Factory)]
    #[case("Perusahaan", RoleKind::Company)]
    #[case("farmer", RoleKind::Farmer)]
    #[case("Company", RoleKind::Company)]
    fn test_parse_role(#[case] tag: &str, #[case] expected: RoleKind) {
        assert_eq!(tag.parse::<RoleKind>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("admin")]
    #[case("petanii")]
    fn test_parse_unknown_role(#[case] tag: &str) {
        assert!(matches!(
            tag.parse::<RoleKind>(),
            Err(IdentityError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_serde_uses_wire_tags() {
        for role in RoleKind::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
            assert_eq!(serde_json::from_str::<RoleKind>(&json).unwrap(), role);
        }
    }

    proptest! {
        #[test]
        fn prop_canonical_tag_round_trips_in_any_case(
            index in 0usize..4,
            mask in proptest::collection::vec(any::<bool>(), 10),
        ) {
            let role = RoleKind::ALL[index];
            let mixed: String = role
                .as_str()
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
                .collect();

            prop_assert_eq!(mixed.parse::<RoleKind>().unwrap(), role);
        }

        #[test]
        fn prop_unrecognized_tags_are_rejected(tag in "[a-z]{1,12}") {
            let known = ["petani", "farmer", "logistik", "logistics", "pabrik", "factory", "perusahaan", "company"];
            prop_assume!(!known.contains(&tag.as_str()));
            prop_assert!(tag.parse::<RoleKind>().is_err());
        }
    }
}
