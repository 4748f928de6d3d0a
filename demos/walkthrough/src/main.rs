use std::sync::Arc;
use std::time::Duration;

use socialconnect::prelude::*;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn describe(app: &App<MemoryProvider>, view: &View) -> String {
    let page = match view {
        View::Page(route) => format!("page {:?}", route.name),
        View::Loading => "loading placeholder".to_string(),
        View::NotFound(path) => format!("not found ({path})"),
    };
    match app.notice() {
        Some(notice) => format!("{page} at {} [{notice}]", app.current_path()),
        None => format!("{page} at {}", app.current_path()),
    }
}

fn show(app: &App<MemoryProvider>, step: &str, view: &View) {
    println!("{step:<40} -> {}", describe(app, view));
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), AppError> {
    socialconnect::telemetry::init("warn");

    let provider = Arc::new(
        MemoryProvider::new()
            .with_latency(Duration::from_millis(50))
            .with_account("u1", "ada@example.com", "ada", "correct-horse"),
    );
    let mut app = App::boot(Arc::clone(&provider), AppConfig::from_env(), "/connections")?;

    // A protected page opened cold: placeholder first, then sign-in.
    let view = app.view();
    show(&app, "open /connections", &view);
    let view = app.settled_view().await?;
    show(&app, "session settled", &view);

    // Bad password, then the right one: back where we started.
    if let Err(e) = app.sign_in("ada", "wrong").await {
        println!("{:<40} -> error: {e}", "sign in with a wrong password");
    }
    let view = app.sign_in("ada@example.com", "correct-horse").await?;
    show(&app, "sign in", &view);

    if let Some(profile) = app.profile_path() {
        let view = app.navigate(&profile);
        show(&app, "open own profile", &view);
    }
    let view = app.navigate("/settings");
    show(&app, "open /settings", &view);

    // Another device ends the session.
    app.navigate("/messages");
    provider.force_sign_out();
    let view = app.next_view().await?;
    show(&app, "signed out elsewhere", &view);

    // Forgotten password, starting signed out.
    app.navigate("/reset-password");
    app.request_password_reset("ada@example.com").await?;
    for (email, link) in provider.password_reset_requests() {
        println!("{:<40} -> {email}: {link}", "reset link sent");
    }
    provider.follow_reset_link("ada@example.com")?;
    let view = app.next_view().await?;
    show(&app, "open reset link", &view);
    app.navigate("/update-password");
    let view = app.update_password("battery-staple").await?;
    show(&app, "update password", &view);
    let view = app.sign_in("ada", "battery-staple").await?;
    show(&app, "sign in with new password", &view);

    let view = app.sign_out().await;
    show(&app, "sign out", &view);

    app.shutdown().await;
    tracing::info!("walkthrough finished");
    Ok(())
}
