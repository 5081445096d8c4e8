use std::env;

use scrawl_core::config::{
    normalize_base_url, normalize_text_option, ClientConfig, DEFAULT_NOTES_TABLE,
};

use crate::cli::ConfigCommands;
use crate::config_profiles::{default_config_path, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            notes_table,
            no_activate,
        } => run_config_init(
            profile,
            supabase_url,
            supabase_anon_key,
            notes_table,
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    notes_table: Option<String>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(
        &existing,
        CliProfile {
            supabase_url,
            supabase_anon_key,
            notes_table,
        },
        |key| env::var(key).ok(),
    )?;
    *config.profile_mut_or_default(&profile_name) = merged.clone();

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!("Profile '{profile_name}' initialized at {}", path.display());

    let missing = missing_fields(&merged);
    if missing.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `scrawl auth login --email <email> --password <password>`."
        );
    } else {
        println!("Profile '{profile_name}' is missing: {}", missing.join(", "));
    }

    Ok(())
}

/// Explicit values win over environment variables, which win over what the
/// profile already stores. A complete result is validated before it is kept.
pub fn merge_profile(
    existing: &CliProfile,
    explicit: CliProfile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<CliProfile, CliError> {
    let pick = |explicit: Option<String>, key: &str, stored: &Option<String>| {
        normalize_text_option(explicit)
            .or_else(|| normalize_text_option(env(key)))
            .or_else(|| normalize_text_option(stored.clone()))
    };

    let mut merged = CliProfile {
        supabase_url: pick(explicit.supabase_url, "SUPABASE_URL", &existing.supabase_url),
        supabase_anon_key: pick(
            explicit.supabase_anon_key,
            "SUPABASE_ANON_KEY",
            &existing.supabase_anon_key,
        ),
        notes_table: pick(explicit.notes_table, "SCRAWL_NOTES_TABLE", &existing.notes_table),
    };

    if let (Some(url), Some(key)) = (&merged.supabase_url, &merged.supabase_anon_key) {
        let validated = ClientConfig::new(url, key, merged.notes_table.clone())?;
        merged.supabase_url = Some(validated.supabase_url);
    } else if let Some(url) = &merged.supabase_url {
        merged.supabase_url = Some(normalize_base_url(url)?);
    }

    Ok(merged)
}

fn missing_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.supabase_url.is_none() {
        missing.push("supabase_url");
    }
    if profile.supabase_anon_key.is_none() {
        missing.push("supabase_anon_key");
    }
    missing
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let path = default_config_path().map_err(CliError::Config)?;

    println!("config: {}", path.display());
    let Some(profile) = config.profile(&profile_name) else {
        println!("Profile '{profile_name}' is not configured.");
        return Ok(());
    };

    let active = config.active_profile.as_deref() == Some(profile_name.as_str());
    println!(
        "profile: {profile_name}{}",
        if active { " (active)" } else { "" }
    );
    println!(
        "supabase_url: {}",
        profile.supabase_url.as_deref().unwrap_or("(unset)")
    );
    println!(
        "supabase_anon_key: {}",
        profile
            .supabase_anon_key
            .as_deref()
            .map_or_else(|| "(unset)".to_string(), mask_secret)
    );
    println!(
        "notes_table: {}",
        profile.notes_table.as_deref().unwrap_or(DEFAULT_NOTES_TABLE)
    );
    Ok(())
}

/// Keep the first and last four characters of a key.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
