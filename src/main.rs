use iced::widget::{column, container, horizontal_rule, Column};
use iced::{Element, Length, Subscription, Task, Theme};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Declare the application modules
mod backend;
mod config;
mod create;
mod media;
mod shell;
mod ui;
mod world;

use backend::{Backend, User};
use config::AppConfig;
use create::{CreateEvent, CreateScreen, Services};
use media::{FfmpegRecorder, PreviewRegistry};
use shell::{Gate, Screen, Shell};
use ui::auth::{SignInForm, SignInMessage};
use world::WorldContext;

/// Main application state
struct Aurevi {
    /// Backend, recorder and configuration shared with screens
    services: Services,
    /// Active world, readable by every screen
    world: WorldContext,
    /// Current screen, its parameters and the session gate
    shell: Shell,
    /// Sign-in form shown while signed out
    sign_in: SignInForm,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// Bottom bar item pressed, carrying the screen identifier
    Navigate(String),
    /// World pill pressed, carrying the world identifier
    WorldSelected(String),
    /// Startup identity lookup finished
    SessionResolved(Option<User>),
    /// Identity provider reported a sign-in or sign-out
    SessionChanged(Option<User>),
    /// Event for the Create screen with the given mount id
    Create(u64, CreateEvent),
    SignIn(SignInMessage),
    SignInFinished(Result<User, String>),
    SignOut,
    SignOutFinished(Result<(), String>),
}

impl Aurevi {
    /// Create a new instance of the application
    fn new(services: Services) -> (Self, Task<Message>) {
        let identity = Arc::clone(&services.backend.identity);

        // Resolve the session once; the gate shows a loading indicator meanwhile
        let resolve = Task::perform(
            async move {
                match identity.current_user().await {
                    Ok(user) => user,
                    Err(e) => {
                        tracing::warn!("⚠️  could not resolve session: {}", e);
                        None
                    }
                }
            },
            Message::SessionResolved,
        );

        tracing::info!(
            "🎬 AUREVI starting ({:?} backend, bucket {})",
            services.config.backend,
            services.config.bucket
        );

        (
            Aurevi {
                services,
                world: WorldContext::new(),
                shell: Shell::new(),
                sign_in: SignInForm::default(),
            },
            resolve,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(id) => self.open(Screen::from_id(&id), None),
            Message::WorldSelected(id) => {
                if let Err(e) = self.world.select(&id) {
                    tracing::warn!("⚠️  {}", e);
                }
                Task::none()
            }
            Message::SessionResolved(user) | Message::SessionChanged(user) => {
                self.shell.resolve_session(user);
                Task::none()
            }
            Message::Create(mount_id, event) => match self.shell.create_mut(mount_id) {
                Some(screen) => screen
                    .update(event, &self.services)
                    .map(move |event| Message::Create(mount_id, event)),
                None => {
                    // Work started by a screen that is no longer mounted
                    tracing::debug!("dropping event for unmounted create screen {}", mount_id);
                    Task::none()
                }
            },
            Message::SignIn(message) => match self.sign_in.update(message) {
                Some((email, password)) => {
                    let identity = Arc::clone(&self.services.backend.identity);
                    Task::perform(
                        async move {
                            identity
                                .sign_in(&email, &password)
                                .await
                                .map_err(|e| e.to_string())
                        },
                        Message::SignInFinished,
                    )
                }
                None => Task::none(),
            },
            Message::SignInFinished(Ok(user)) => {
                self.sign_in.finished(Ok(()));
                self.shell.resolve_session(Some(user));
                Task::none()
            }
            Message::SignInFinished(Err(e)) => {
                tracing::warn!("⚠️  sign-in failed: {}", e);
                self.sign_in.finished(Err(e));
                Task::none()
            }
            Message::SignOut => {
                let identity = Arc::clone(&self.services.backend.identity);
                Task::perform(
                    async move { identity.sign_out().await.map_err(|e| e.to_string()) },
                    Message::SignOutFinished,
                )
            }
            Message::SignOutFinished(Ok(())) => {
                self.shell.resolve_session(None);
                self.open(Screen::Home, None)
            }
            Message::SignOutFinished(Err(e)) => {
                tracing::warn!("⚠️  sign-out failed: {}", e);
                Task::none()
            }
        }
    }

    /// Navigate, mounting a fresh Create screen when needed
    fn open(&mut self, screen: Screen, params: shell::ScreenParams) -> Task<Message> {
        let Some(mount_id) = self.shell.navigate(screen, params) else {
            return Task::none();
        };

        let (create, task) = CreateScreen::mount(mount_id, &self.services, &self.world);
        self.shell.attach_create(create);
        task.map(move |event| Message::Create(mount_id, event))
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let screen = match self.shell.gate() {
            Gate::Loading => return ui::screens::loading(),
            Gate::SignIn => return self.sign_in.view().map(Message::SignIn),
            Gate::Screen(screen) => screen,
        };

        let body: Element<Message> = match (screen, self.shell.create()) {
            (Screen::Create, Some(create)) => {
                let mount_id = create.mount_id();
                ui::create::view(create).map(move |event| Message::Create(mount_id, event))
            }
            _ => ui::screens::placeholder(&self.shell),
        };

        let content: Column<Message> = column![
            ui::screens::header(screen, self.shell.user(), Message::SignOut),
            ui::world_switcher::view(self.world.active(), Message::WorldSelected),
            horizontal_rule(1),
            container(body).height(Length::Fill),
            ui::bottom_bar::view(screen, Message::Navigate),
        ]
        .spacing(12)
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Session changes for as long as the application runs
    fn subscription(&self) -> Subscription<Message> {
        let changes = self.services.backend.identity.on_session_change().into_stream();
        Subscription::run_with_id("session-changes", changes).map(Message::SessionChanged)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aurevi=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The app cannot do anything useful without its configuration and backend
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let backend = match Backend::from_config(&config) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("❌ could not connect the backend: {}", e);
            std::process::exit(1);
        }
    };

    let recorder = FfmpegRecorder::new(
        config.ffmpeg.clone(),
        config.camera_device.clone(),
        config.capture_dir.clone(),
    );

    let services = Services {
        backend,
        recorder: Arc::new(recorder),
        config: Arc::new(config),
        previews: PreviewRegistry::new(),
    };

    iced::application("AUREVI", Aurevi::update, Aurevi::view)
        .theme(Aurevi::theme)
        .subscription(Aurevi::subscription)
        .centered()
        .run_with(move || Aurevi::new(services))
}
