/// Navigation shell: current screen, its parameters and the session gate.

use serde_json::Value;

use crate::backend::User;
use crate::create::CreateScreen;

/// Every screen of the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Screen {
    #[default]
    Home,
    Explore,
    Create,
    Market,
    MarketPublish,
    MarketDetail,
    Library,
    Wallet,
    Notifications,
    Profile,
    Watch,
    Messages,
}

impl Screen {
    pub const ALL: &'static [Screen] = &[
        Screen::Home,
        Screen::Explore,
        Screen::Create,
        Screen::Market,
        Screen::MarketPublish,
        Screen::MarketDetail,
        Screen::Library,
        Screen::Wallet,
        Screen::Notifications,
        Screen::Profile,
        Screen::Watch,
        Screen::Messages,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::Explore => "explore",
            Screen::Create => "create",
            Screen::Market => "market",
            Screen::MarketPublish => "marketPublish",
            Screen::MarketDetail => "marketDetail",
            Screen::Library => "library",
            Screen::Wallet => "wallet",
            Screen::Notifications => "notifications",
            Screen::Profile => "profile",
            Screen::Watch => "watch",
            Screen::Messages => "messages",
        }
    }

    /// Unknown identifiers land on home
    pub fn from_id(id: &str) -> Screen {
        Screen::ALL
            .iter()
            .copied()
            .find(|screen| screen.id() == id)
            .unwrap_or(Screen::Home)
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Explore => "Explore",
            Screen::Create => "Create",
            Screen::Market => "Market",
            Screen::MarketPublish => "Publish an item",
            Screen::MarketDetail => "Market item",
            Screen::Library => "My library",
            Screen::Wallet => "Wallet",
            Screen::Notifications => "Notifications",
            Screen::Profile => "Profile",
            Screen::Watch => "Watch",
            Screen::Messages => "Messages",
        }
    }
}

/// Free-form parameters passed along with a navigation
pub type ScreenParams = Option<Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    SignedOut,
    SignedIn(User),
}

/// What the window should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Loading,
    SignIn,
    Screen(Screen),
}

pub struct Shell {
    current: Screen,
    params: ScreenParams,
    session: SessionState,
    create: Option<CreateScreen>,
    mounts: u64,
}

impl Shell {
    pub fn new() -> Self {
        Self {
            current: Screen::Home,
            params: None,
            session: SessionState::Loading,
            create: None,
            mounts: 0,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// String parameter, e.g. `videoId` for the watch screen
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.as_ref()?.get(key)?.as_str()
    }

    pub fn user(&self) -> Option<&User> {
        match &self.session {
            SessionState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    /// Replace screen and parameters together.
    ///
    /// Leaving (or re-entering) create tears the mounted Create screen down.
    /// Returns the mount id for a new Create screen when one is needed.
    pub fn navigate(&mut self, screen: Screen, params: ScreenParams) -> Option<u64> {
        tracing::debug!(from = self.current.id(), to = screen.id(), "🧭 navigate");
        self.current = screen;
        self.params = params;
        self.create = None;

        if screen == Screen::Create {
            self.mounts += 1;
            Some(self.mounts)
        } else {
            None
        }
    }

    /// Attach a mounted Create screen if it belongs to the current mount
    pub fn attach_create(&mut self, screen: CreateScreen) {
        if self.current == Screen::Create && screen.mount_id() == self.mounts {
            self.create = Some(screen);
        }
    }

    /// The Create screen with the given mount id, if it is still mounted
    pub fn create_mut(&mut self, mount_id: u64) -> Option<&mut CreateScreen> {
        self.create
            .as_mut()
            .filter(|screen| screen.mount_id() == mount_id)
    }

    pub fn create(&self) -> Option<&CreateScreen> {
        self.create.as_ref()
    }

    pub fn resolve_session(&mut self, user: Option<User>) {
        self.session = match user {
            Some(user) => {
                tracing::info!("👤 signed in as {}", user.email.as_deref().unwrap_or(&user.id));
                SessionState::SignedIn(user)
            }
            None => SessionState::SignedOut,
        };
    }

    pub fn gate(&self) -> Gate {
        match self.session {
            SessionState::Loading => Gate::Loading,
            SessionState::SignedOut => Gate::SignIn,
            SessionState::SignedIn(_) => Gate::Screen(self.current),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::Backend;
    use crate::config::AppConfig;
    use crate::create::Services;
    use crate::media::{FfmpegRecorder, PreviewRegistry};
    use crate::world::WorldContext;
    use serde_json::json;
    use std::sync::Arc;

    fn services() -> Services {
        let config = AppConfig::for_tests();
        Services {
            backend: Backend::from_shared(Arc::new(MemoryBackend::signed_in("u1"))),
            recorder: Arc::new(FfmpegRecorder::new("ffmpeg", None, config.capture_dir.clone())),
            config: Arc::new(config),
            previews: PreviewRegistry::new(),
        }
    }

    #[test]
    fn test_screen_ids_round_trip() {
        for screen in Screen::ALL {
            assert_eq!(Screen::from_id(screen.id()), *screen);
        }
        assert_eq!(Screen::from_id("marketPublish"), Screen::MarketPublish);
    }

    #[test]
    fn test_unknown_screen_falls_back_to_home() {
        assert_eq!(Screen::from_id("settings"), Screen::Home);
        assert_eq!(Screen::from_id(""), Screen::Home);
    }

    #[test]
    fn test_navigate_replaces_screen_and_params() {
        let mut shell = Shell::new();
        shell.navigate(Screen::Watch, Some(json!({ "videoId": "v42" })));
        assert_eq!(shell.current(), Screen::Watch);
        assert_eq!(shell.param_str("videoId"), Some("v42"));

        shell.navigate(Screen::Messages, None);
        assert_eq!(shell.current(), Screen::Messages);
        assert!(shell.params().is_none());
    }

    #[test]
    fn test_session_gate() {
        let mut shell = Shell::new();
        assert_eq!(shell.gate(), Gate::Loading);

        shell.resolve_session(None);
        assert_eq!(shell.gate(), Gate::SignIn);

        shell.resolve_session(Some(User {
            id: "u1".to_string(),
            email: None,
        }));
        assert_eq!(shell.gate(), Gate::Screen(Screen::Home));
        assert_eq!(shell.user().map(|u| u.id.as_str()), Some("u1"));

        shell.resolve_session(None);
        assert_eq!(shell.gate(), Gate::SignIn);
    }

    #[test]
    fn test_create_mounts_and_tears_down() {
        let services = services();
        let world = WorldContext::new();
        let mut shell = Shell::new();

        let first = shell.navigate(Screen::Create, None).unwrap();
        let (screen, _task) = CreateScreen::mount(first, &services, &world);
        shell.attach_create(screen);
        assert!(shell.create_mut(first).is_some());

        shell.navigate(Screen::Home, None);
        assert!(shell.create().is_none());
        assert!(shell.create_mut(first).is_none());

        // a late mount from an old navigation is ignored
        let second = shell.navigate(Screen::Create, None).unwrap();
        assert_ne!(first, second);
        let (stale, _task) = CreateScreen::mount(first, &services, &world);
        shell.attach_create(stale);
        assert!(shell.create().is_none());
    }

    /// Counts stop requests; recordings never finish on their own
    #[derive(Default)]
    struct CountingRecorder {
        stops: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl crate::media::CameraRecorder for CountingRecorder {
        async fn record(
            &self,
            _request: crate::media::RecordRequest,
        ) -> Result<crate::media::MediaBlob, crate::media::RecorderError> {
            std::future::pending().await
        }

        fn stop(&self) {
            self.stops.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn test_leaving_create_stops_recording() {
        use crate::create::CreateEvent;
        use std::sync::atomic::Ordering;

        let recorder = Arc::new(CountingRecorder::default());
        let services = Services {
            recorder: recorder.clone(),
            ..services()
        };
        let world = WorldContext::new();
        let mut shell = Shell::new();

        let id = shell.navigate(Screen::Create, None).unwrap();
        let (screen, _task) = CreateScreen::mount(id, &services, &world);
        shell.attach_create(screen);

        let _ = shell
            .create_mut(id)
            .unwrap()
            .update(CreateEvent::StartRecording, &services);
        assert!(shell.create().unwrap().flow().is_recording());
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 0);

        shell.navigate(Screen::Home, None);
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_leaving_create_idle_leaves_recorder_alone() {
        use std::sync::atomic::Ordering;

        let recorder = Arc::new(CountingRecorder::default());
        let services = Services {
            recorder: recorder.clone(),
            ..services()
        };
        let world = WorldContext::new();
        let mut shell = Shell::new();

        let id = shell.navigate(Screen::Create, None).unwrap();
        let (screen, _task) = CreateScreen::mount(id, &services, &world);
        shell.attach_create(screen);

        shell.navigate(Screen::Create, None);
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_leaving_create_releases_preview() {
        use crate::create::CreateEvent;
        use crate::media::MediaBlob;

        let services = services();
        let world = WorldContext::new();
        let mut shell = Shell::new();

        let id = shell.navigate(Screen::Create, None).unwrap();
        let (screen, _task) = CreateScreen::mount(id, &services, &world);
        shell.attach_create(screen);

        let blob = MediaBlob::new("clip.mp4", "/tmp/clip.mp4", 10);
        let _ = shell
            .create_mut(id)
            .unwrap()
            .update(CreateEvent::FilePicked(Ok(Some(blob))), &services);
        assert_eq!(services.previews.live_count(), 1);

        shell.navigate(Screen::Explore, None);
        assert_eq!(services.previews.live_count(), 0);
    }
}
