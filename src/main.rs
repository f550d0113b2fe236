use std::env;

use chrono::Utc;
use log::error;
use tokio::sync::mpsc;

use hackathon_recs::normalize::{countdown_display, normalize_record, KeywordSource};
use hackathon_recs::{
    export_recommendations, open_session, sign_in, sign_out, sign_up, ClientConfig,
    CountdownTicker, RecommendationClient, RefreshOutcome, SessionController, SessionEntry,
    SessionView,
};

const USAGE: &str = "Usage:
  hackrec login <username> <password>
  hackrec register <username> <email> <password> [skill,skill,...]
  hackrec logout
  hackrec show
  hackrec refresh
  hackrec export
  hackrec watch";

fn render(controller: &SessionController<RecommendationClient>) {
    let state = controller.state();
    if let Some(profile) = &state.profile {
        println!("Recommendations for {} ({})", profile.username, profile.skills.join(", "));
    }
    if let Some(message) = &state.error {
        println!("! {}", message);
    }

    match state.view() {
        SessionView::Loading => println!("Loading..."),
        SessionView::Error(_) => println!("Nothing to show. Try `hackrec refresh`."),
        SessionView::Empty => {
            println!("No recommendations yet. Add more skills to your profile and refresh.")
        }
        SessionView::List(records) => {
            let now = Utc::now();
            for (i, record) in records.iter().enumerate() {
                let view = normalize_record(record, now);
                println!();
                println!("[{}] {}  {} match", i + 1, view.title, view.match_percentage);
                println!("    {}", view.countdown);
                match view.keyword_source {
                    KeywordSource::None => println!("    keywords: not available"),
                    _ => println!("    keywords: {}", view.keywords.join(", ")),
                }
                if let Some(description) = &record.description {
                    let marker = if view.truncated { " (truncated)" } else { "" };
                    println!("    {}{}", description, marker);
                }
                match view.embedding_dimensions {
                    Some(dims) => println!("    embedding: {} dimensions", dims),
                    None => println!("    embedding: not available"),
                }
            }
        }
    }
}

async fn active_session(
    config: &ClientConfig,
) -> Result<Option<SessionController<RecommendationClient>>, Box<dyn std::error::Error>> {
    match open_session(config).await? {
        SessionEntry::Active(mut controller) => {
            controller.load().await;
            Ok(Some(controller))
        }
        SessionEntry::RedirectToLogin => {
            println!("Not signed in. Run `hackrec login <username> <password>` first.");
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("show");
    let config = ClientConfig::load()?;

    match command {
        "login" => {
            let (Some(username), Some(password)) = (args.get(2), args.get(3)) else {
                return Err(USAGE.into());
            };
            match sign_in(&config, username, password).await {
                Ok(id) => println!("Signed in (user {}).", id),
                Err(e) => {
                    error!("Login failed: {}", e);
                    println!("{}", e.user_message());
                }
            }
        }
        "register" => {
            let (Some(username), Some(email), Some(password)) =
                (args.get(2), args.get(3), args.get(4))
            else {
                return Err(USAGE.into());
            };
            let skills: Vec<String> = args
                .get(5)
                .map(|s| {
                    s.split(',')
                        .map(|skill| skill.trim().to_string())
                        .filter(|skill| !skill.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            let id = sign_up(&config, username, email, password, &skills).await?;
            println!("Registered and signed in (user {}).", id);
        }
        "logout" => {
            sign_out(&config).await?;
            println!("Signed out.");
        }
        "show" => {
            if let Some(controller) = active_session(&config).await? {
                render(&controller);
            }
        }
        "refresh" => {
            if let Some(mut controller) = active_session(&config).await? {
                if controller.refresh().await == RefreshOutcome::Failed {
                    println!("Refresh failed; showing the last loaded list.");
                }
                render(&controller);
            }
        }
        "export" => {
            if let Some(controller) = active_session(&config).await? {
                match export_recommendations(&controller.state().recommendations, &config).await? {
                    Some(path) => println!("Saved {}", path.display()),
                    None => println!("No recommendations to export."),
                }
            }
        }
        "watch" => {
            let Some(controller) = active_session(&config).await? else {
                return Ok(());
            };
            render(&controller);

            let (tx, mut rx) = mpsc::unbounded_channel();
            let _ticker = CountdownTicker::spawn(config.countdown_interval(), move || {
                let _ = tx.send(());
            });

            while rx.recv().await.is_some() {
                let now = Utc::now();
                println!();
                for record in &controller.state().recommendations {
                    println!("{}: {}", record.title, countdown_display(record, now));
                }
            }
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}
