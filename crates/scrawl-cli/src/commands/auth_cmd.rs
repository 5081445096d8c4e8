use scrawl_core::auth::SignUpOutcome;
use scrawl_core::gate::resolve_session;
use scrawl_core::{AuthState, SessionWatch};

use crate::auth::{clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::commands::common::ProfileContext;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            let context = ProfileContext::resolve(profile)?;
            let session = context.auth_client()?.sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or(&email);
            println!("Signed in profile '{}' as {email_label}", context.name);
            Ok(())
        }
        AuthCommands::Signup { email, password } => {
            let context = ProfileContext::resolve(profile)?;
            match context.auth_client()?.sign_up(&email, &password).await? {
                SignUpOutcome::SignedIn(_) => {
                    println!("Created account and signed in profile '{}' as {email}", context.name);
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!("Check {email} for a confirmation link, then run `scrawl auth login`.");
                }
            }
            Ok(())
        }
        AuthCommands::Status => run_status(profile).await,
        AuthCommands::Logout => run_logout(profile).await,
    }
}

async fn run_status(profile: Option<&str>) -> Result<(), CliError> {
    let context = match ProfileContext::resolve(profile) {
        Ok(context) => context,
        Err(CliError::NotConfigured(name)) => {
            println!("Profile '{name}' is not configured.");
            return Ok(());
        }
        Err(error) => return Err(error),
    };

    let client = context.auth_client()?;
    let watch = SessionWatch::new();
    let restored = resolve_session(&client, &watch).await?;

    match (watch.current(), restored) {
        (AuthState::Authenticated(session), Some(auth)) => {
            let email_label = session.email.as_deref().unwrap_or("(no email)");
            println!(
                "Profile '{}' is signed in as {email_label} (expires_at={})",
                context.name, auth.expires_at
            );
        }
        _ => println!("Profile '{}' is not signed in.", context.name),
    }
    Ok(())
}

async fn run_logout(profile: Option<&str>) -> Result<(), CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = profiles.resolve_profile_name(profile);
    let stored_session = load_stored_session(&profile_name)?;

    let client = match profiles.profile(&profile_name).cloned().unwrap_or_default().client_config() {
        Ok(Some(config)) => Some(ProfileContext {
            name: profile_name.clone(),
            config,
        }),
        Ok(None) | Err(_) => None,
    };

    if let (Some(context), Some(session)) = (client, stored_session) {
        context.auth_client()?.sign_out(&session.access_token).await?;
    } else {
        clear_stored_session(&profile_name)?;
    }

    println!("Signed out profile '{profile_name}'");
    Ok(())
}
