use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use dialoguer::{Input, Password, Select};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roadmap_tracker::{
    cli::{Cli, Command, ConfigArgs, DashboardArgs, LoginArgs, RegisterArgs, SetupArgs, StatusArgs},
    client::ApiClient,
    config::ClientConfig,
    error::{ServiceError, ServiceResult},
    render,
    session::{Route, SessionContext},
    storage::FileCredentialStore,
    transport::UreqTransport,
    types::SkillStatus,
    views::{
        Notice,
        auth::{AuthView, LoginForm, RegistrationForm},
        dashboard::{DashboardState, DashboardView, StatusChangeOutcome},
        events::UiEvent,
        setup::SetupView,
    },
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.global.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{}", render::notice(&Notice::error(e.to_string())));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> ServiceResult<()> {
    let config = ClientConfig::resolve(&cli.global.overrides())?;

    if let Command::Version = cli.command {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if let Command::Config(args) = &cli.command {
        return config_command(&cli, config, args);
    }

    let store = FileCredentialStore::new(config.session_path()?);
    store.initialize()?;
    tracing::debug!("Session store at {}", store.path().display());
    let client = ApiClient::new(
        &config.api_base_url,
        Arc::new(UreqTransport::new(config.timeout())),
        Arc::new(store),
    );
    let ctx = SessionContext::new(client);

    match cli.command {
        Command::Register(args) => register(&ctx, args).await,
        Command::Login(args) => login(&ctx, args).await,
        Command::Logout => {
            ctx.logout()?;
            println!("{}", render::notice(&Notice::success("Logged out.")));
            Ok(())
        }
        Command::Whoami => {
            require(&ctx, Route::Dashboard)?;
            let user = match ctx.current_user()? {
                Some(user) => user,
                None => ctx.client().get_me().await?,
            };
            println!("{}", render::user(&user));
            Ok(())
        }
        Command::Goals => {
            let goals = ctx.client().get_career_goals().await?;
            for goal in goals.career_goals {
                println!("- {}", goal);
            }
            Ok(())
        }
        Command::Setup(args) => setup(&ctx, &config, args).await,
        Command::Dashboard(args) => dashboard(&ctx, args).await,
        Command::Status(args) => status(&ctx, args).await,
        Command::Roadmaps => {
            require(&ctx, Route::Dashboard)?;
            let roadmaps = ctx.client().get_my_roadmaps().await?;
            println!("{}", render::roadmap_list(&roadmaps));
            Ok(())
        }
        Command::Config(_) | Command::Version => Ok(()),
    }
}

fn require(ctx: &SessionContext, route: Route) -> ServiceResult<()> {
    match ctx.guard(route) {
        Route::Entry => Err(ServiceError::NotAuthenticated),
        _ => Ok(()),
    }
}

fn prompt_password(given: Option<String>) -> ServiceResult<String> {
    match given {
        Some(password) => Ok(password),
        None => Ok(Password::new().with_prompt("Password").interact()?),
    }
}

async fn register(ctx: &SessionContext, args: RegisterArgs) -> ServiceResult<()> {
    let form = RegistrationForm {
        username: args.username,
        password: prompt_password(args.password)?,
        email: args.email,
    };
    let mut view = AuthView::new(ctx.clone());
    let result = view.submit_register(&form).await;
    if let Some(notice) = &view.notice {
        println!("{}", render::notice(notice));
    }
    if result.is_ok() {
        if let Some(username) = view.username_hint {
            println!("Next: roadmap login --username {}", username);
        }
    }
    Ok(())
}

async fn login(ctx: &SessionContext, args: LoginArgs) -> ServiceResult<()> {
    if ctx.guard(Route::Entry) == Route::Dashboard {
        println!("{}", render::notice(&Notice::info("Already logged in.")));
        return dashboard(ctx, DashboardArgs { roadmap: 1, interactive: false }).await;
    }

    let form = LoginForm {
        username: args.username,
        password: prompt_password(args.password)?,
    };
    let mut view = AuthView::new(ctx.clone());
    let route = view.dispatch(UiEvent::LoginSubmitted(form)).await;
    if let Some(notice) = &view.notice {
        println!("{}", render::notice(notice));
    }
    match route {
        Some(Route::Dashboard) => {
            dashboard(ctx, DashboardArgs { roadmap: 1, interactive: false }).await
        }
        _ => Ok(()),
    }
}

fn choose(prompt: &str, items: &[String]) -> ServiceResult<String> {
    let index = Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()?;
    Ok(items[index].clone())
}

async fn setup(ctx: &SessionContext, config: &ClientConfig, args: SetupArgs) -> ServiceResult<()> {
    require(ctx, Route::Setup)?;

    let mut view = SetupView::new(ctx.clone(), config.redirect_delay());
    if !view.load().await {
        if let Some(notice) = &view.notice {
            println!("{}", render::notice(notice));
        }
        return Ok(());
    }

    let goal = match args.goal {
        Some(goal) => goal,
        None => choose("Career goal", &view.career_goals)?,
    };
    let levels: Vec<String> = view.learning_levels().iter().map(|l| l.to_string()).collect();
    let level = match args.level {
        Some(level) => level,
        None => choose("Learning level", &levels)?,
    };
    if let Err(e) = view.select_career_goal(&goal) {
        return Err(ServiceError::Validation(e.to_string()));
    }
    if let Err(e) = view.select_learning_level(&level) {
        return Err(ServiceError::Validation(e.to_string()));
    }

    let interactive = args.skills.is_empty();
    for skill in args.skills {
        view.dispatch(UiEvent::SkillAdded(skill)).await;
        if let Some(notice) = view.notice.take() {
            println!("{}", render::notice(&notice));
        }
    }
    if interactive {
        collect_known_skills(&mut view).await?;
    }

    let route = view.dispatch(UiEvent::SetupSubmitted).await;
    if let Some(notice) = &view.notice {
        println!("{}", render::notice(notice));
    }
    match route {
        Some(Route::Dashboard) => {
            dashboard(ctx, DashboardArgs { roadmap: 1, interactive: false }).await
        }
        _ => Ok(()),
    }
}

/// Prompt for already-known skills until an empty line. `-name` removes one.
async fn collect_known_skills(view: &mut SetupView) -> ServiceResult<()> {
    println!("Skills you already know (empty line to finish, -name to remove):");
    loop {
        let line: String = Input::new()
            .with_prompt("Skill")
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let event = match line.strip_prefix('-') {
            Some(name) => UiEvent::SkillRemoved(name.to_string()),
            None => UiEvent::SkillAdded(line.to_string()),
        };
        view.dispatch(event).await;
        if let Some(notice) = view.notice.take() {
            println!("{}", render::notice(&notice));
        }
        println!("Known skills: {}", view.form.known_skills().join(", ").dimmed());
    }
}

async fn open_dashboard(ctx: &SessionContext, roadmap: usize) -> ServiceResult<Option<DashboardView>> {
    require(ctx, Route::Dashboard)?;
    let mut view = DashboardView::new(ctx.clone());
    println!("{}", render::dashboard(&view.state, None));
    if let Some(Route::Entry) = view.try_load().await? {
        println!("{}", render::dashboard(&view.state, view.notice.as_ref()));
        return Ok(None);
    }
    if roadmap > 1 {
        view.dispatch(UiEvent::RoadmapSelected(roadmap - 1)).await;
    }
    Ok(Some(view))
}

async fn dashboard(ctx: &SessionContext, args: DashboardArgs) -> ServiceResult<()> {
    let Some(mut view) = open_dashboard(ctx, args.roadmap).await? else {
        return Ok(());
    };
    println!("{}", render::dashboard(&view.state, view.notice.take().as_ref()));

    if args.interactive {
        interactive_dashboard(&mut view).await?;
    }
    Ok(())
}

async fn interactive_dashboard(view: &mut DashboardView) -> ServiceResult<()> {
    loop {
        let DashboardState::Populated(model) = &view.state else {
            return Ok(());
        };

        let mut items: Vec<String> = model
            .cards
            .iter()
            .map(|c| format!("{} [{}]", c.skill.skill_name, c.displayed_status.label()))
            .collect();
        let status_ids: Vec<i64> = model.cards.iter().map(|c| c.skill.status_id).collect();
        items.push("Reload".to_string());
        items.push("Log out".to_string());
        items.push("Quit".to_string());

        let picked = Select::new()
            .with_prompt("Pick a skill to update")
            .items(&items)
            .default(0)
            .interact()?;

        let event = if picked < status_ids.len() {
            let statuses: Vec<String> = SkillStatus::ALL.iter().map(|s| s.label().to_string()).collect();
            let choice = Select::new()
                .with_prompt("New status")
                .items(&statuses)
                .default(0)
                .interact()?;
            UiEvent::StatusControlClicked {
                status_id: status_ids[picked],
                status: SkillStatus::ALL[choice],
            }
        } else {
            match picked - status_ids.len() {
                0 => UiEvent::ReloadRequested,
                1 => UiEvent::LogoutClicked,
                _ => return Ok(()),
            }
        };

        if let Some(Route::Entry) = view.dispatch(event).await {
            println!("{}", render::notice(&Notice::success("Logged out.")));
            return Ok(());
        }
        println!("{}", render::dashboard(&view.state, view.notice.take().as_ref()));
    }
}

async fn status(ctx: &SessionContext, args: StatusArgs) -> ServiceResult<()> {
    let Some(mut view) = open_dashboard(ctx, args.roadmap).await? else {
        return Ok(());
    };
    let outcome = view.change_status(args.status_id, args.status).await;
    let notice = view.notice.take();
    match outcome {
        StatusChangeOutcome::Confirmed => {
            println!("{}", render::dashboard(&view.state, None));
            println!(
                "{}",
                render::notice(&Notice::success(format!(
                    "Status updated to {}",
                    args.status.label()
                )))
            );
            Ok(())
        }
        StatusChangeOutcome::Rejected(rejected) => Err(ServiceError::Validation(rejected.to_string())),
        StatusChangeOutcome::SavedNotRefreshed { route: None } => {
            println!("{}", render::dashboard(&view.state, notice.as_ref()));
            Ok(())
        }
        StatusChangeOutcome::SavedNotRefreshed { route: Some(_) }
        | StatusChangeOutcome::Discarded { .. } => {
            println!("{}", render::dashboard(&view.state, None));
            let message = notice
                .map(|n| n.message)
                .unwrap_or_else(|| "Failed to update skill status".to_string());
            Err(ServiceError::Validation(message))
        }
    }
}

fn config_command(cli: &Cli, config: ClientConfig, args: &ConfigArgs) -> ServiceResult<()> {
    let path = match &cli.global.config {
        Some(path) => path.clone(),
        None => config.data_dir()?.join("config.toml"),
    };

    if !args.edit {
        println!("# {}", path.display());
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let api_base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(config.api_base_url.clone())
        .interact_text()?;
    let timeout_secs: u64 = Input::new()
        .with_prompt("Request timeout (seconds)")
        .default(config.timeout_secs)
        .interact_text()?;

    let updated = ClientConfig {
        api_base_url: roadmap_tracker::config::normalize_base_url(&api_base_url),
        timeout_secs,
        ..config
    };
    updated.validate()?;
    updated.save(&path)?;
    println!(
        "{}",
        render::notice(&Notice::success(format!("Saved {}", path.display())))
    );
    Ok(())
}
