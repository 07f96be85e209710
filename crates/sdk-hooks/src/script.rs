use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HookError, Result};

/// A named shell command configured by the project or SDK, e.g. `npm run build`.
///
/// In the hooks file a script is a bare JSON string; the name is assigned
/// after loading (see [`crate::config::SdkHooks::assign_names`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookScript {
    pub name: String,
    pub command: String,
}

impl HookScript {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// `true` when the command is non-empty after trimming.
    pub fn is_available(&self) -> bool {
        !self.command.trim().is_empty()
    }

    /// Return the trimmed command, or [`HookError::NotFound`] when unconfigured.
    pub fn get(&self) -> Result<&str> {
        if !self.is_available() {
            return Err(HookError::NotFound {
                name: self.name.clone(),
            });
        }
        Ok(self.command.trim())
    }
}

impl<'de> Deserialize<'de> for HookScript {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let command = String::deserialize(deserializer)?;
        Ok(Self {
            name: String::new(),
            command,
        })
    }
}

impl Serialize for HookScript {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_commands_are_unavailable() {
        for command in ["", " ", "\t\n  "] {
            let script = HookScript::new("batman", command);
            assert!(!script.is_available());
            let err = script.get().unwrap_err();
            assert!(matches!(err, HookError::NotFound { ref name } if name == "batman"));
            assert!(err.to_string().contains("batman"));
        }
    }

    #[test]
    fn get_returns_trimmed_command() {
        let script = HookScript::new("Build", "  npm run build \n");
        assert!(script.is_available());
        assert_eq!(script.get().unwrap(), "npm run build");
    }

    #[test]
    fn deserializes_from_bare_string() {
        let script: HookScript = serde_json::from_str(r#""deno run start.ts""#).unwrap();
        assert_eq!(script.command, "deno run start.ts");
        assert!(script.name.is_empty());
    }

    #[test]
    fn rejects_non_string_json() {
        assert!(serde_json::from_str::<HookScript>(r#"{"command": "x"}"#).is_err());
    }

    #[test]
    fn serializes_as_command_string() {
        let script = HookScript::new("Start", "python app.py");
        assert_eq!(serde_json::to_string(&script).unwrap(), r#""python app.py""#);
    }
}
