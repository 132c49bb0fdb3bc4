//! Config subcommand handlers.

use dialoguer::Input;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_url() -> Result<String, CliError> {
    Input::new()
        .with_prompt("Scanner URL")
        .default("http://scanner.local:5000".to_owned())
        .interact_text()
        .map_err(prompt_err)
}

#[derive(Serialize)]
struct ProfileEntry {
    name: String,
    default: bool,
    #[serde(flatten)]
    profile: Profile,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Stream")]
    stream: String,
}

fn profile_row(entry: &ProfileEntry) -> ProfileRow {
    ProfileRow {
        marker: if entry.default { "*" } else { "" },
        name: entry.name.clone(),
        url: entry.profile.url.clone(),
        prefix: entry.profile.prefix.clone(),
        stream: entry.profile.stream.clone(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            url,
            name,
            route_prefix,
            stream,
            force,
        } => {
            let mut cfg = config::load_config()?;
            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: format!("profile '{name}' already exists; pass --force to replace it"),
                });
            }

            let url = match url {
                Some(url) => url,
                None => prompt_url()?,
            };

            let mut profile = Profile::new(url);
            profile.prefix = route_prefix;
            profile.stream = stream;
            // Reject anything the scanner commands could not use later.
            config::profile_to_device_config(&profile, &cfg.defaults)?;

            cfg.profiles.insert(name.clone(), profile);
            let has_default = cfg
                .default_profile
                .as_ref()
                .is_some_and(|d| cfg.profiles.contains_key(d));
            if !has_default {
                cfg.default_profile = Some(name.clone());
            }

            let path = config::save_config(&cfg)?;
            util::done(
                &format!("Profile '{name}' written to {}", path.display()),
                global,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("# {e}")),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let entries = profile_entries(&cfg);
            let out =
                output::render_list(&global.output, &entries, profile_row, |e| e.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            util::done(&format!("Default profile set to '{name}'"), global);
            Ok(())
        }
    }
}

fn profile_entries(cfg: &Config) -> Vec<ProfileEntry> {
    cfg.profiles
        .iter()
        .map(|(name, profile)| ProfileEntry {
            name: name.clone(),
            default: cfg.default_profile.as_deref() == Some(name.as_str()),
            profile: profile.clone(),
        })
        .collect()
}
