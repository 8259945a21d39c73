// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret input via environment variable or TTY prompt.

use envia_core::EnviaError;
use secrecy::SecretString;

pub const WHATSAPP_TOKEN_ENV_VAR: &str = "ENVIA_WHATSAPP_TOKEN";
pub const SMTP_PASSWORD_ENV_VAR: &str = "ENVIA_SMTP_PASSWORD";

/// Read a secret from `env_var`, falling back to a hidden prompt on a TTY.
pub fn read_secret(label: &str, env_var: &str) -> Result<SecretString, EnviaError> {
    if let Ok(value) = std::env::var(env_var)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("{label}: ");
        let value = rpassword::read_password()
            .map_err(|e| EnviaError::Validation(format!("failed to read {label}: {e}")))?;
        if value.trim().is_empty() {
            return Err(EnviaError::Validation(format!("{label} must not be empty")));
        }
        return Ok(SecretString::from(value));
    }

    Err(EnviaError::Validation(format!(
        "no {label} provided. Set {env_var} or run interactively."
    )))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use serial_test::serial;

    use super::*;

    const VAR: &str = "ENVIA_TEST_PROMPT_SECRET";

    #[test]
    #[serial]
    fn environment_wins() {
        // SAFETY: serialized with the other environment tests.
        unsafe { std::env::set_var(VAR, "s3cret") };
        let secret = read_secret("token", VAR).unwrap();
        assert_eq!(secret.expose_secret(), "s3cret");
        unsafe { std::env::remove_var(VAR) };
    }

    #[test]
    #[serial]
    fn empty_variable_is_ignored() {
        unsafe { std::env::set_var(VAR, "") };
        if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
            let err = read_secret("token", VAR).unwrap_err();
            assert!(err.to_string().contains(VAR));
        }
        unsafe { std::env::remove_var(VAR) };
    }
}
