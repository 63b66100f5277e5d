//! Policies the engine consults, and the subset that `$<TARGET_POLICY>` may
//! query.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Policy {
    Cmp0003,
    Cmp0004,
    Cmp0008,
    Cmp0020,
    Cmp0021,
    Cmp0022,
    Cmp0027,
    Cmp0038,
    Cmp0041,
    Cmp0042,
    Cmp0043,
    Cmp0044,
    Cmp0046,
    Cmp0052,
    Cmp0060,
    Cmp0063,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Old,
    #[default]
    Warn,
    New,
    RequiredIfUsed,
    RequiredAlways,
}

impl Policy {
    /// Policies recorded per target, and therefore visible to `$<TARGET_POLICY>`.
    pub fn is_target_policy(self) -> bool {
        !matches!(self, Policy::Cmp0043 | Policy::Cmp0044)
    }

    pub fn target_policies() -> impl Iterator<Item = Policy> {
        Policy::iter().filter(|p| p.is_target_policy())
    }

    pub fn title(self) -> &'static str {
        match self {
            Policy::Cmp0003 => "Libraries linked via full path no longer produce linker search paths.",
            Policy::Cmp0004 => "Libraries linked may not have leading or trailing whitespace.",
            Policy::Cmp0008 => "Libraries linked by full-path must have a valid library file name.",
            Policy::Cmp0020 => "Automatically link Qt executables to qtmain target on Windows.",
            Policy::Cmp0021 => "Fatal error on relative paths in INCLUDE_DIRECTORIES target property.",
            Policy::Cmp0022 => "INTERFACE_LINK_LIBRARIES defines the link interface.",
            Policy::Cmp0027 => "Conditionally linked imported targets with missing include directories.",
            Policy::Cmp0038 => "Targets may not link directly to themselves.",
            Policy::Cmp0041 => "Error on relative include with generator expression.",
            Policy::Cmp0042 => "MACOSX_RPATH is enabled by default.",
            Policy::Cmp0043 => "Ignore COMPILE_DEFINITIONS_<Config> properties",
            Policy::Cmp0044 => "Case sensitive <LANG>_COMPILER_ID generator expressions",
            Policy::Cmp0046 => "Error on non-existent dependency in add_dependencies.",
            Policy::Cmp0052 => "Reject source and build dirs in installed INTERFACE_INCLUDE_DIRECTORIES.",
            Policy::Cmp0060 => "Link libraries by full path even in implicit directories.",
            Policy::Cmp0063 => "Honor visibility properties for all target types.",
        }
    }

    /// Text of the diagnostic emitted when a policy is consulted while unset.
    pub fn warning(self) -> String {
        format!(
            "Policy {} is not set: {}  Run \"cmake --help-policy {}\" for policy details.  \
             Use the cmake_policy command to set the policy and suppress this warning.",
            self,
            self.title(),
            self
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_policy_names() {
        assert_eq!(Policy::Cmp0044.to_string(), "CMP0044");
        assert_eq!(Policy::from_str("CMP0063").unwrap(), Policy::Cmp0063);
        assert!(Policy::from_str("cmp0063").is_err());
        assert!(Policy::from_str("CMP9999").is_err());
    }

    #[test]
    fn test_target_policy_allow_list() {
        let listed: Vec<_> = Policy::target_policies().map(|p| p.to_string()).collect();
        assert_eq!(listed.len(), 14);
        assert!(!listed.contains(&"CMP0043".to_string()));
        assert!(listed.contains(&"CMP0003".to_string()));
    }

    #[test]
    fn test_status_serde() {
        let status: PolicyStatus = serde_json::from_str("\"REQUIRED_IF_USED\"").unwrap();
        assert_eq!(status, PolicyStatus::RequiredIfUsed);
        assert_eq!(PolicyStatus::default(), PolicyStatus::Warn);
        assert!(Policy::Cmp0044.warning().starts_with("Policy CMP0044 is not set: Case sensitive"));
    }
}
