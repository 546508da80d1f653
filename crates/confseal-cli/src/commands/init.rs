use std::path::PathBuf;

use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::app::{layout_dir_for, AppContext};
use crate::cli::InitArgs;
use crate::config::{
    write_config, CipherBackend, ConfsealConfig, PassphraseSource, DEFAULT_CONTACT,
};
use crate::constants::LOCAL_CONFIG_FILE;
use crate::errors::CliError;
use crate::ui::{badge, hint, kv, print, Badge};

static BACKENDS: [(CipherBackend, &str); 2] = [
    (CipherBackend::External, "external  - openssl CAST5, compatible with existing .cast5 files"),
    (CipherBackend::Age, "age       - built in, no external tool needed"),
];

static SOURCES: [(PassphraseSource, &str); 4] = [
    (PassphraseSource::Prompt, "prompt    - ask each run (or read CONFSEAL_PASSPHRASE)"),
    (PassphraseSource::Env, "env       - read CONFSEAL_PASSPHRASE only"),
    (PassphraseSource::Keychain, "keychain  - ask once, remember in the OS keychain"),
    (PassphraseSource::Tool, "tool      - let the cipher tool ask for every file"),
];

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false);
    let path = args
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

    if path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}\nHint: Pass --force to replace it.",
            path.display()
        ))
        .into());
    }

    let mut config = ConfsealConfig::default();
    if ctx.interactive() {
        choose_settings(&mut config, args.contact.as_deref())?;
    } else if let Some(contact) = &args.contact {
        config.passphrase.contact = contact.clone();
    }
    if config.passphrase.contact.trim().is_empty() {
        return Err(CliError::invalid_input("Contact cannot be empty").into());
    }

    write_config(&path, &config)?;

    let dir = layout_dir_for(Some(path.as_path()), &config.layout.dir);
    let created = if dir.exists() {
        false
    } else {
        std::fs::create_dir_all(&dir).map_err(|e| {
            anyhow::anyhow!("Failed to create config directory {}: {}", dir.display(), e)
        })?;
        true
    };

    if !ctx.quiet() {
        print(
            &ui,
            &badge(&ui, Badge::Ok, &format!("Wrote {}", path.display())),
        );
        let dir_note = if created {
            format!("{} (created)", dir.display())
        } else {
            dir.display().to_string()
        };
        print(&ui, &kv(&ui, "Directory", &dir_note));
        print(&ui, &kv(&ui, "Contact", &config.passphrase.contact));
        print(
            &ui,
            &hint(
                &ui,
                &format!(
                    "Keep *{} out of version control and commit the *{} files.",
                    config.layout.plaintext_suffix, config.layout.ciphertext_suffix
                ),
            ),
        );
    }
    Ok(())
}

fn choose_settings(config: &mut ConfsealConfig, contact: Option<&str>) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();

    let backend = Select::with_theme(&theme)
        .with_prompt("Cipher backend")
        .items(&BACKENDS.map(|(_, label)| label))
        .default(0)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read selection: {}", e))?;
    config.cipher.backend = BACKENDS[backend].0;

    let sources = source_choices(config.cipher.backend);
    let source = Select::with_theme(&theme)
        .with_prompt("Passphrase source")
        .items(&sources.iter().map(|(_, label)| *label).collect::<Vec<_>>())
        .default(0)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read selection: {}", e))?;
    config.passphrase.source = sources[source].0;

    config.passphrase.contact = match contact {
        Some(contact) => contact.to_string(),
        None => Input::<String>::with_theme(&theme)
            .with_prompt("Who holds the passphrase?")
            .default(DEFAULT_CONTACT.to_string())
            .interact_text()
            .map_err(|e| anyhow::anyhow!("Failed to read contact: {}", e))?,
    };
    Ok(())
}

/// Passphrase sources that work with `backend`; age cannot prompt by itself.
fn source_choices(backend: CipherBackend) -> Vec<&'static (PassphraseSource, &'static str)> {
    SOURCES
        .iter()
        .filter(|(source, _)| {
            !(backend == CipherBackend::Age && *source == PassphraseSource::Tool)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_menu_hides_tool_source() {
        let age: Vec<_> = source_choices(CipherBackend::Age)
            .iter()
            .map(|(source, _)| *source)
            .collect();
        assert!(!age.contains(&PassphraseSource::Tool));
        assert_eq!(age.len(), 3);

        let external = source_choices(CipherBackend::External);
        assert_eq!(external.len(), SOURCES.len());
        assert_eq!(external[0].0, PassphraseSource::Prompt);
    }
}
