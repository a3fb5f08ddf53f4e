//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::error::{Result, VettError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chat and ask require an OpenAI API key.
    Chat,
    /// The search server requires a Tavily API key.
    SearchServer,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Chat => {
            check_env_key(
                "OPENAI_API_KEY",
                "Set it with: export OPENAI_API_KEY='sk-...'",
            )?;
        }
        Operation::SearchServer => {
            check_env_key(
                "TAVILY_API_KEY",
                "Set it with: export TAVILY_API_KEY='tvly-...'",
            )?;
        }
    }
    Ok(())
}

/// Check that an environment variable is set and non-empty.
fn check_env_key(name: &str, hint: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(VettError::Config(format!("{} is empty. {}", name, hint))),
        Err(_) => Err(VettError::Config(format!("{} not set. {}", name, hint))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_env_key_missing() {
        let err = check_env_key("VETT_TEST_KEY_THAT_DOES_NOT_EXIST", "set it").unwrap_err();
        assert!(err.to_string().contains("not set"));
    }
}
