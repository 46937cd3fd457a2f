//! Interactive terminal prompts
//!
//! Questions are rendered on stderr so stdout stays JSON.

use crate::config::{KeySource, ProviderKind};
use crate::secrets::DEFAULT_KEY_NAME;
use crate::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};
use secrecy::SecretString;

/// Provider menu, in display order
const PROVIDERS: [(ProviderKind, &str); 2] = [
    (ProviderKind::Vault, "HashiCorp Vault"),
    (ProviderKind::Local, "Plain-text base64 encoded keypair"),
];

/// Questions the toolkit asks the operator
pub trait Prompter {
    fn select_provider(&mut self) -> Result<ProviderKind>;

    /// Non-empty Vault path of the keypair record
    fn vault_path(&mut self) -> Result<String>;

    /// Field of the Vault record, defaulting to [`DEFAULT_KEY_NAME`]
    fn vault_key_name(&mut self) -> Result<String>;

    /// Keypair value, entered without echo
    fn keypair(&mut self) -> Result<SecretString>;

    /// Yes/no question, defaulting to no
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// dialoguer prompts on the controlling terminal
#[derive(Default)]
pub struct Terminal {
    theme: ColorfulTheme,
}

impl Prompter for Terminal {
    fn select_provider(&mut self) -> Result<ProviderKind> {
        let labels: Vec<&str> = PROVIDERS.iter().map(|(_, label)| *label).collect();
        let index = Select::with_theme(&self.theme)
            .with_prompt("Select validator key provider")
            .items(&labels)
            .default(0)
            .interact()?;
        Ok(provider_at(index))
    }

    fn vault_path(&mut self) -> Result<String> {
        let path: String = Input::with_theme(&self.theme)
            .with_prompt("Enter Vault path to keypair")
            .validate_with(|input: &String| non_empty(input, "Path must not be empty"))
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn vault_key_name(&mut self) -> Result<String> {
        let key: String = Input::with_theme(&self.theme)
            .with_prompt("Enter the key name in Vault")
            .default(DEFAULT_KEY_NAME.to_string())
            .interact_text()?;
        Ok(key)
    }

    fn keypair(&mut self) -> Result<SecretString> {
        let value = Password::with_theme(&self.theme)
            .with_prompt("Enter base64 encoded keypair")
            .validate_with(|input: &String| non_empty(input, "Keypair must not be empty"))
            .interact()?;
        Ok(SecretString::from(value))
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact()?)
    }
}

fn provider_at(index: usize) -> ProviderKind {
    PROVIDERS
        .get(index)
        .map_or(ProviderKind::Vault, |(provider, _)| *provider)
}

fn non_empty(input: &str, hint: &'static str) -> std::result::Result<(), &'static str> {
    if input.trim().is_empty() {
        Err(hint)
    } else {
        Ok(())
    }
}

/// Ask for whatever `source` is missing
pub fn complete_key_source(prompter: &mut dyn Prompter, mut source: KeySource) -> Result<KeySource> {
    let provider = match source.provider {
        Some(provider) => provider,
        None => prompter.select_provider()?,
    };
    source.provider = Some(provider);

    match provider {
        ProviderKind::Vault => {
            if source.path.as_deref().map_or(true, |p| p.trim().is_empty()) {
                source.path = Some(prompter.vault_path()?);
            }
            if source.key.is_none() {
                source.key = Some(prompter.vault_key_name()?);
            }
        }
        ProviderKind::Local => {
            if source.needs_input() {
                source.value = Some(prompter.keypair()?);
            }
        }
    }

    Ok(source)
}
