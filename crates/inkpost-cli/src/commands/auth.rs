use anyhow::Result;
use inkpost_application::{Route, SignUpOutcome};

use crate::AuthAction;
use crate::app::AppState;

pub async fn run(state: &AppState, action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { email, password } => {
            if Route::Auth.guard(&state.observer.current()) != Route::Auth
                && let Some(user) = state.observer.user()
            {
                println!("Already signed in as {} <{}>", user.display_name, user.email);
                return Ok(());
            }
            let user = state.auth.sign_in(&email, &password).await?;
            println!("Signed in as {} <{}>", user.display_name, user.email);
        }
        AuthAction::Signup {
            email,
            password,
            full_name,
        } => match state
            .auth
            .sign_up(&email, &password, full_name.as_deref())
            .await?
        {
            SignUpOutcome::SignedIn(user) => {
                println!("Welcome, {}! You are signed in.", user.display_name);
            }
            SignUpOutcome::ConfirmationPending => {
                println!("Check {} for a confirmation link, then sign in.", email);
            }
        },
        AuthAction::Logout => {
            state.auth.sign_out().await?;
            println!("Signed out");
        }
        AuthAction::Whoami => match state.observer.user() {
            Some(user) => println!("{} <{}> ({})", user.display_name, user.email, user.id),
            None => println!("Not signed in"),
        },
    }
    Ok(())
}
