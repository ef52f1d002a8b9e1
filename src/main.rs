//! OwnTV - Rust Edition
//! A TV-style channel browser for the public iptv-org directory

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

mod api;
mod config;
mod deeplink;
mod directory;
mod error;
mod focus;
mod home_sync;
mod logos;
mod models;
mod player;
mod selection;
mod storage;

use api::DirectoryClient;
use config::AppConfig;
use deeplink::DeepLink;
use directory::ChannelFilter;
use focus::{GridFocus, Nav};
use home_sync::{HomeScreenSync, LauncherFile};
use logos::LogoCache;
use models::{MergedChannel, Screen};
use player::{Direction, ExternalPlayer, PlaybackSession, PlayerEvent};
use selection::Selection;
use storage::{FileStore, SelectionStore};

const FOCUS_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 105, 180);
const MOVING_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 191, 255);

/// Get current local time as HH:MM:SS
fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Window icon: a dark TV with a pink play button
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            let in_body = (0.08..=0.92).contains(&nx) && (0.15..=0.75).contains(&ny);
            let in_screen = (0.14..=0.86).contains(&nx) && (0.21..=0.69).contains(&ny);
            let in_stand = (0.38..=0.62).contains(&nx) && (0.78..=0.84).contains(&ny);
            let in_play = {
                let px = nx - 0.42;
                let py = ny - 0.45;
                (0.0..=0.18).contains(&px) && py.abs() <= (0.18 - px) * 0.7
            };

            let pixel: [u8; 4] = if in_screen && in_play {
                [255, 105, 180, 255]
            } else if in_screen {
                [18, 18, 18, 255]
            } else if in_body || in_stand {
                [70, 70, 90, 255]
            } else {
                [0, 0, 0, 0]
            };
            rgba[idx..idx + 4].copy_from_slice(&pixel);
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

/// Add a system emoji font so channel names and icons render
fn install_emoji_fonts(ctx: &egui::Context) {
    #[cfg(target_os = "windows")]
    let candidates: &[&str] = &["C:\\Windows\\Fonts\\seguiemj.ttf"];
    #[cfg(target_os = "macos")]
    let candidates: &[&str] = &["/System/Library/Fonts/Apple Color Emoji.ttc"];
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let candidates: &[&str] = &[
        "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
        "/usr/share/fonts/noto-emoji/NotoColorEmoji.ttf",
        "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ];

    let Some(font_data) = candidates.iter().find_map(|p| std::fs::read(p).ok()) else {
        return;
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("emoji".to_owned(), egui::FontData::from_owned(font_data).into());
    fonts
        .families
        .entry(egui::FontFamily::Proportional)
        .or_default()
        .push("emoji".to_owned());
    ctx.set_fonts(fonts);
}

fn apply_visuals(ctx: &egui::Context, config: &AppConfig) {
    ctx.set_visuals(if config.dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    });

    let base = config.font_size.clamp(10, 32) as f32;
    ctx.style_mut(|style| {
        for (text_style, font) in style.text_styles.iter_mut() {
            font.size = match text_style {
                egui::TextStyle::Heading => base * 1.6,
                egui::TextStyle::Small => base * 0.8,
                _ => base,
            };
        }
    });
}

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("owntv=info")),
        )
        .init();

    // owntv://player?id=... style link as the first argument
    let link = std::env::args().nth(1).and_then(|arg| {
        let parsed = DeepLink::parse(&arg);
        if parsed.is_none() {
            tracing::warn!("Ignoring unknown link: {}", arg);
        }
        parsed
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([960.0, 540.0])
            .with_icon(load_icon()),
        vsync: true,
        ..Default::default()
    };

    eframe::run_native(
        "OwnTV",
        options,
        Box::new(move |cc| {
            install_emoji_fonts(&cc.egui_ctx);
            Ok(Box::new(OwnTvApp::new(&cc.egui_ctx, link)))
        }),
    )
}

/// Background task messages
enum TaskResult {
    DirectoryLoaded(Vec<MergedChannel>),
    PlayerLog(String),
    PlayerExited { code: Option<i32>, channel: String },
    LogoLoaded { url: String, image: Option<egui::ColorImage> },
}

impl From<PlayerEvent> for TaskResult {
    fn from(event: PlayerEvent) -> Self {
        match event {
            PlayerEvent::Log(line) => TaskResult::PlayerLog(line),
            PlayerEvent::Exited { code, channel } => TaskResult::PlayerExited { code, channel },
        }
    }
}

/// Working copy edited on the reorder screen until "Save Order"
struct ReorderState {
    channels: Selection,
    selected: Option<usize>,
}

/// Modal message box
struct Dialog {
    title: String,
    message: String,
    return_home: bool,
}

enum StoreAction {
    Add(MergedChannel),
    Remove(String),
    Pick(String, usize),
}

struct OwnTvApp {
    config: AppConfig,
    screen: Screen,
    status_message: String,
    loading: bool,

    // Background task channel
    task_receiver: Receiver<TaskResult>,
    task_sender: Sender<TaskResult>,

    // Directory and lineup
    directory: Vec<MergedChannel>,
    selection: Selection,
    selection_ready: bool,
    store: SelectionStore<FileStore>,
    home_sync: Box<dyn HomeScreenSync>,

    // Channel store
    filter: ChannelFilter,
    moving: Option<String>,

    // Home grid
    home_focus: GridFocus,
    scroll_to_focus: bool,

    logos: LogoCache,
    logo_client: DirectoryClient,

    // Playback
    session: Option<PlaybackSession>,
    player: ExternalPlayer,
    feedback: Option<(String, Instant)>,

    reorder: Option<ReorderState>,
    dialog: Option<Dialog>,

    // Console log
    console_log: Vec<String>,
}

impl OwnTvApp {
    fn new(ctx: &egui::Context, link: Option<DeepLink>) -> Self {
        let config = AppConfig::load();
        apply_visuals(ctx, &config);

        let dir = config::app_dir();
        let launcher = LauncherFile::new(dir.join("home_channels.json"));
        let mut app = Self::with_storage(config, FileStore::new(&dir), Box::new(launcher));

        app.log(&format!("[INFO] OwnTV started - {} channels in lineup", app.selection.len()));
        if let Some(link) = link {
            app.open_link(link);
        }
        app
    }

    fn with_storage(config: AppConfig, files: FileStore, home_sync: Box<dyn HomeScreenSync>) -> Self {
        let store = SelectionStore::new(files);
        let selection = Selection::from_entries(store.load().unwrap_or_default());
        let (task_sender, task_receiver) = channel();
        let logo_client = DirectoryClient::new(&config.api_base, config.request_timeout_secs);

        Self {
            config,
            screen: Screen::Home,
            status_message: "Ready".to_string(),
            loading: false,
            task_receiver,
            task_sender,
            directory: Vec::new(),
            selection,
            selection_ready: false,
            store,
            home_sync,
            filter: ChannelFilter::default(),
            moving: None,
            home_focus: GridFocus::default(),
            scroll_to_focus: false,
            logos: LogoCache::default(),
            logo_client,
            session: None,
            player: ExternalPlayer::new(),
            feedback: None,
            reorder: None,
            dialog: None,
            console_log: Vec::new(),
        }
    }

    /// Start downloads for logos first seen this frame
    fn request_logos(&mut self, urls: Vec<String>) {
        for url in urls {
            if !self.logos.begin(&url) {
                continue;
            }
            let sender = self.task_sender.clone();
            let client = self.logo_client.clone();
            thread::spawn(move || {
                let image = client
                    .get_bytes(&url)
                    .and_then(|bytes| logos::decode(&bytes, logos::LOGO_MAX_SIDE));
                if let Err(e) = &image {
                    tracing::debug!("Logo unavailable {}: {}", url, e);
                }
                let _ = sender.send(TaskResult::LogoLoaded { url, image: image.ok() });
            });
        }
    }

    fn log(&mut self, message: &str) {
        tracing::info!(target: "owntv::console", "{}", message);
        self.console_log.push(format!("[{}] {}", timestamp_now(), message));
        // Keep last 500 lines
        if self.console_log.len() > 500 {
            self.console_log.remove(0);
        }
    }

    fn open_link(&mut self, link: DeepLink) {
        self.log(&format!("[INFO] Link opens {:?}", link.screen()));
        match link {
            DeepLink::Home => self.screen = Screen::Home,
            DeepLink::Settings => self.open_settings(),
            DeepLink::Reorder => self.open_reorder(),
            DeepLink::Player(id) => match self.selection.position(&id) {
                Some(idx) => {
                    self.home_focus.index = idx;
                    self.open_player(idx);
                }
                None => self.log(&format!("[WARN] Channel '{}' is not in the lineup", id)),
            },
        }
    }

    fn go_home(&mut self) {
        if self.screen == Screen::Player {
            self.player.stop();
            self.session = None;
        }
        self.moving = None;
        self.screen = Screen::Home;
    }

    // ---- Directory ----

    fn fetch_directory(&mut self) {
        if self.loading {
            return;
        }
        self.loading = true;
        self.status_message = "Loading channels...".to_string();
        self.log(&format!("[INFO] Fetching directory from {}", self.config.api_base));

        let sender = self.task_sender.clone();
        let base = self.config.api_base.clone();
        let timeout = self.config.request_timeout_secs;

        thread::spawn(move || {
            let client = DirectoryClient::new(&base, timeout);
            let _ = sender.send(TaskResult::DirectoryLoaded(client.fetch_merged()));
        });
    }

    fn on_directory_loaded(&mut self, channels: Vec<MergedChannel>) {
        self.loading = false;
        self.log(&format!("[INFO] Directory loaded: {} playable channels", channels.len()));

        // Fresh records replace saved ones; channels dropped upstream stay as saved
        if let Some(saved) = self.store.load() {
            self.selection = Selection::from_entries(directory::reconcile(&saved, &channels));
        }
        self.directory = channels;
        self.selection_ready = true;
        self.persist_selection();

        self.status_message = if self.directory.is_empty() {
            "Channel directory unavailable".to_string()
        } else {
            format!("Loaded {} channels", self.directory.len())
        };
    }

    /// Save the lineup and refresh the launcher row; failures are logged only
    fn persist_selection(&mut self) {
        match self.store.save(self.selection.as_slice()) {
            Ok(()) => {
                if self.config.home_sync_enabled {
                    home_sync::sync_selection(
                        self.home_sync.as_ref(),
                        self.selection.as_slice(),
                        self.config.home_sync_limit,
                    );
                }
            }
            Err(e) => self.log(&format!("[ERROR] Auto-save error: {}", e)),
        }
    }

    // ---- Player ----

    fn open_player(&mut self, index: usize) {
        if self.selection.is_empty() {
            self.status_message = "No channels selected".to_string();
            return;
        }
        self.session = Some(PlaybackSession::new(
            self.selection.to_vec(),
            index,
            Duration::from_secs(self.config.info_overlay_secs),
        ));
        self.screen = Screen::Player;
        self.launch_current();
    }

    fn launch_current(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let Some(channel) = session.current().cloned() else {
            return;
        };
        let volume = session.volume();
        let player = player::resolve_player(&self.config.external_player);

        self.log(&format!("[PLAY] {} | Player: {}", channel.name, player));
        self.log(&format!("[PLAY] URL: {}", channel.url));

        let events = self.task_sender.clone();
        match self
            .player
            .play(&player, &channel, volume, self.config.single_window_mode, events)
        {
            Ok(pid) => {
                self.log(&format!("[PLAY] Player launched successfully (PID: {})", pid));
                self.status_message = format!("Playing {}", channel.name);
            }
            Err(e) => {
                self.log(&format!("[ERROR] {}", e));
                self.status_message = e.to_string();
            }
        }
    }

    fn show_feedback(&mut self, text: String) {
        self.feedback = Some((text, Instant::now() + Duration::from_secs(1)));
    }

    fn handle_player_keys(&mut self, ctx: &egui::Context) {
        let (next, prev, vol_down, vol_up, info, mute, back) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::M),
                i.key_pressed(egui::Key::Escape) || i.key_pressed(egui::Key::Backspace),
            )
        });

        if back {
            self.go_home();
            return;
        }
        if next {
            self.switch_channel(Direction::Next);
        } else if prev {
            self.switch_channel(Direction::Prev);
        }
        if vol_down || vol_up {
            let step = if vol_up { self.config.volume_step } else { -self.config.volume_step };
            self.adjust_volume(step);
        }
        if mute {
            self.toggle_mute();
        }
        if info {
            if let Some(session) = self.session.as_mut() {
                session.toggle_info();
            }
        }
    }

    fn switch_channel(&mut self, direction: Direction) {
        let changed = self
            .session
            .as_mut()
            .and_then(|s| s.change_channel(direction).map(|c| c.name.clone()));
        if let Some(name) = changed {
            self.log(&format!("[INFO] Channel -> {}", name));
            self.launch_current();
        }
    }

    fn adjust_volume(&mut self, delta: f32) {
        if let Some(session) = self.session.as_mut() {
            let v = session.adjust_volume(delta);
            self.show_feedback(format!("🔊 {}%", (v * 100.0).round()));
        }
    }

    fn toggle_mute(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let text = if session.toggle_mute() {
                "🔇 0%".to_string()
            } else {
                format!("🔊 {}%", (session.volume() * 100.0).round())
            };
            self.show_feedback(text);
        }
    }

    // ---- Channel store ----

    fn open_settings(&mut self) {
        self.screen = Screen::Settings;
        self.moving = None;
        if !self.selection_ready {
            self.fetch_directory();
        }
    }

    fn apply_store_action(&mut self, action: StoreAction) {
        match action {
            StoreAction::Add(channel) => {
                self.status_message = format!("Added '{}'", channel.name);
                self.selection.add(channel);
            }
            StoreAction::Remove(id) => {
                if self.moving.as_deref() == Some(id.as_str()) {
                    self.moving = None;
                }
                if let Some(channel) = self.selection.remove(&id) {
                    self.status_message = format!("Removed '{}'", channel.name);
                }
            }
            StoreAction::Pick(id, index) => match self.moving.take() {
                // Pick up
                None => {
                    self.moving = Some(id);
                    return;
                }
                // Same item again cancels
                Some(moving) if moving == id => return,
                // Drop at the target's slot
                Some(moving) => {
                    if !self.selection.move_to(&moving, index) {
                        return;
                    }
                }
            },
        }
        self.persist_selection();
    }

    // ---- Reorder ----

    fn open_reorder(&mut self) {
        self.reorder = Some(ReorderState {
            channels: self.store.load().map(Selection::from_entries).unwrap_or_else(Selection::new),
            selected: None,
        });
        self.screen = Screen::Reorder;
    }

    fn save_order(&mut self) {
        let Some(state) = &self.reorder else {
            return;
        };
        let entries = state.channels.to_vec();

        match self.store.save(&entries) {
            Ok(()) => {
                self.selection = Selection::from_entries(entries);
                if self.config.home_sync_enabled {
                    home_sync::sync_selection(
                        self.home_sync.as_ref(),
                        self.selection.as_slice(),
                        self.config.home_sync_limit,
                    );
                }
                self.log("[INFO] Channel order saved");
                self.dialog = Some(Dialog {
                    title: "Success".to_string(),
                    message: "Channel order saved!".to_string(),
                    return_home: true,
                });
            }
            Err(e) => {
                self.log(&format!("[ERROR] Error saving order: {}", e));
                self.dialog = Some(Dialog {
                    title: "Error".to_string(),
                    message: "Failed to save order.".to_string(),
                    return_home: false,
                });
            }
        }
    }

    fn handle_reorder_keys(&mut self, ctx: &egui::Context) {
        let Some(state) = self.reorder.as_mut() else {
            return;
        };
        // Enter is consumed so the dialog it opens does not see it too
        let (up, down, shift, save) = ctx.input_mut(|i| {
            (
                i.key_pressed(egui::Key::ArrowUp),
                i.key_pressed(egui::Key::ArrowDown),
                i.modifiers.shift,
                i.consume_key(egui::Modifiers::NONE, egui::Key::Enter),
            )
        });
        let len = state.channels.len();
        if len == 0 {
            return;
        }

        if up || down {
            let current = state.selected.unwrap_or(0).min(len - 1);
            state.selected = Some(match (shift, up) {
                // Shift+arrow carries the entry along
                (true, true) => state.channels.move_up(current).unwrap_or(current),
                (true, false) => state.channels.move_down(current).unwrap_or(current),
                (false, true) => current.saturating_sub(1),
                (false, false) => (current + 1).min(len - 1),
            });
        }
        if save {
            self.save_order();
        }
    }

    fn handle_home_keys(&mut self, ctx: &egui::Context) {
        let len = self.selection.len();
        let columns = self.config.grid_columns.max(1);
        let (nav, enter) = ctx.input(|i| {
            let nav = if i.key_pressed(egui::Key::ArrowUp) {
                Some(Nav::Up)
            } else if i.key_pressed(egui::Key::ArrowDown) {
                Some(Nav::Down)
            } else if i.key_pressed(egui::Key::ArrowLeft) {
                Some(Nav::Left)
            } else if i.key_pressed(egui::Key::ArrowRight) {
                Some(Nav::Right)
            } else {
                None
            };
            (nav, i.key_pressed(egui::Key::Enter))
        });

        if let Some(nav) = nav {
            self.home_focus.step(nav, columns, len);
            self.scroll_to_focus = true;
        }
        if enter && len > 0 {
            self.open_player(self.home_focus.index);
        }
    }
}

impl eframe::App for OwnTvApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process background task results (non-blocking)
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::DirectoryLoaded(channels) => self.on_directory_loaded(channels),
                TaskResult::PlayerLog(line) => self.log(&line),
                TaskResult::PlayerExited { code, channel } => {
                    let msg = match code {
                        Some(c) => format!("[WARN] Player exited with code {} for '{}'", c, channel),
                        None => format!("[WARN] Player terminated by signal for '{}'", channel),
                    };
                    self.log(&msg);
                }
                TaskResult::LogoLoaded { url, image } => self.logos.finish(ctx, url, image),
            }
        }

        self.home_focus.clamp(self.selection.len());

        if self.dialog.is_none() && !ctx.wants_keyboard_input() {
            match self.screen {
                Screen::Home => self.handle_home_keys(ctx),
                Screen::Player => self.handle_player_keys(ctx),
                Screen::Reorder => self.handle_reorder_keys(ctx),
                Screen::Settings | Screen::Console => {}
            }
            if self.screen != Screen::Player
                && self.screen != Screen::Home
                && ctx.input(|i| i.key_pressed(egui::Key::Escape))
            {
                self.go_home();
            }
        }

        egui::TopBottomPanel::top("nav_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let mut target = None;
                for (screen, label) in [
                    (Screen::Home, "📺 Live TV"),
                    (Screen::Settings, "⚙ Channel Store"),
                    (Screen::Reorder, "↕ Reorder"),
                    (Screen::Console, "🖥 Console"),
                ] {
                    if ui.selectable_label(self.screen == screen, label).clicked() {
                        target = Some(screen);
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(&self.status_message).weak());
                    if self.loading {
                        ui.spinner();
                    }
                });

                match target {
                    Some(Screen::Home) => self.go_home(),
                    Some(Screen::Settings) => {
                        self.go_home();
                        self.open_settings();
                    }
                    Some(Screen::Reorder) => {
                        self.go_home();
                        self.open_reorder();
                    }
                    Some(Screen::Console) => {
                        self.go_home();
                        self.screen = Screen::Console;
                    }
                    Some(Screen::Player) | None => {}
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.screen {
            Screen::Home => self.show_home(ui),
            Screen::Player => self.show_player(ui),
            Screen::Settings => self.show_settings(ui),
            Screen::Reorder => self.show_reorder(ui),
            Screen::Console => self.show_console(ui),
        });

        self.show_dialog(ctx);

        if self.loading || self.logos.is_loading() || self.screen == Screen::Player {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}

/// Up to two initials used as a logo placeholder
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

/// Logo scaled into `rect`, or the channel initials when there is none
fn paint_logo(ui: &egui::Ui, rect: egui::Rect, logo: Option<&egui::TextureHandle>, name: &str, font_size: f32) {
    match logo {
        Some(texture) => {
            let size = logos::fit(texture.size_vec2(), rect.size());
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter()
                .image(texture.id(), egui::Rect::from_center_size(rect.center(), size), uv, egui::Color32::WHITE);
        }
        None => {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                initials(name),
                egui::FontId::proportional(font_size),
                FOCUS_COLOR,
            );
        }
    }
}

fn channel_card(
    ui: &mut egui::Ui,
    channel: &MergedChannel,
    logo: Option<&egui::TextureHandle>,
    focused: bool,
    size: egui::Vec2,
) -> egui::Response {
    let (fill, stroke) = if focused {
        (egui::Color32::from_rgb(70, 50, 70), egui::Stroke::new(3.0, FOCUS_COLOR))
    } else {
        (egui::Color32::from_rgb(38, 38, 48), egui::Stroke::NONE)
    };

    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    ui.painter().rect(rect, 12.0, fill, stroke, egui::StrokeKind::Inside);

    let name_height = 28.0;
    let logo_rect = egui::Rect::from_min_max(rect.min, egui::pos2(rect.max.x, rect.max.y - name_height))
        .shrink(12.0);
    paint_logo(ui, logo_rect, logo, &channel.name, 32.0);

    let name: String = if channel.name.chars().count() > 28 {
        channel.name.chars().take(27).chain(std::iter::once('…')).collect()
    } else {
        channel.name.clone()
    };
    ui.painter().text(
        egui::pos2(rect.center().x, rect.max.y - name_height / 2.0),
        egui::Align2::CENTER_CENTER,
        name,
        egui::FontId::proportional(15.0),
        egui::Color32::WHITE,
    );

    response
        .on_hover_cursor(egui::CursorIcon::PointingHand)
        .on_hover_text(format!("{} | {}", channel.country, channel.category))
}

/// Row button with a small logo in front when one is loaded
fn logo_row_button(text: String, logo: Option<&egui::TextureHandle>) -> egui::Button<'static> {
    match logo {
        Some(texture) => egui::Button::image_and_text(
            egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
                .fit_to_exact_size(egui::vec2(32.0, 32.0)),
            text,
        ),
        None => egui::Button::new(text),
    }
    .wrap_mode(egui::TextWrapMode::Truncate)
}

impl OwnTvApp {
    fn show_home(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Live TV");
            ui.label(egui::RichText::new(format!("{} channels", self.selection.len())).weak());
        });
        ui.separator();

        if self.selection.is_empty() {
            let mut open_store = false;
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label(egui::RichText::new("Your lineup is empty").strong().size(20.0));
                ui.add_space(10.0);
                ui.label("Pick channels in the channel store to build your own TV.");
                ui.add_space(10.0);
                if ui.button("⚙ Open Channel Store").clicked() {
                    open_store = true;
                }
            });
            if open_store {
                self.open_settings();
            }
            return;
        }

        let columns = self.config.grid_columns.max(1);
        let spacing = 12.0;
        let card_w = ((ui.available_width() - spacing * (columns as f32 - 1.0) - 16.0) / columns as f32).max(120.0);
        let card_h = card_w / 1.4;
        let mut to_play = None;
        let mut wanted = Vec::new();

        egui::ScrollArea::vertical()
            .id_salt("home_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new("home_grid").spacing([spacing, spacing]).show(ui, |ui| {
                    for (idx, channel) in self.selection.iter().enumerate() {
                        let focused = idx == self.home_focus.index;
                        let logo = self.logos.lookup(channel.logo.as_deref(), &mut wanted);
                        let response = channel_card(ui, channel, logo, focused, egui::vec2(card_w, card_h));
                        if focused && self.scroll_to_focus {
                            response.scroll_to_me(Some(egui::Align::Center));
                        }
                        if response.clicked() {
                            to_play = Some(idx);
                        }
                        if (idx + 1) % columns == 0 {
                            ui.end_row();
                        }
                    }
                });
            });
        self.scroll_to_focus = false;
        self.request_logos(wanted);

        ui.label(egui::RichText::new("Arrows move · Enter plays").weak().small());

        if let Some(idx) = to_play {
            self.home_focus.index = idx;
            self.open_player(idx);
        }
    }

    fn show_player(&mut self, ui: &mut egui::Ui) {
        let running = self.player.is_running();
        let Some(session) = &self.session else {
            ui.label("Nothing playing");
            return;
        };
        let Some(channel) = session.current().cloned() else {
            ui.label("Nothing playing");
            return;
        };
        let position = format!("{} / {}", session.index() + 1, session.len());
        let info_visible = session.info_visible();
        let volume = session.volume();
        let muted = session.is_muted();

        let mut wanted = Vec::new();
        let logo = self.logos.lookup(channel.logo.as_deref(), &mut wanted).cloned();
        self.request_logos(wanted);

        let feedback = self
            .feedback
            .as_ref()
            .filter(|(_, until)| Instant::now() < *until)
            .map(|(text, _)| text.clone());

        enum Action {
            Next,
            Prev,
            VolDown,
            VolUp,
            Mute,
            Restart,
            Back,
        }
        let mut action = None;

        egui::Frame::new()
            .fill(egui::Color32::from_rgb(12, 12, 12))
            .inner_margin(egui::Margin::symmetric(24, 18))
            .corner_radius(8.0)
            .show(ui, |ui| {
                ui.set_min_size(ui.available_size());
                ui.vertical_centered(|ui| {
                    ui.add_space(30.0);
                    let (logo_rect, _) = ui.allocate_exact_size(egui::vec2(220.0, 140.0), egui::Sense::hover());
                    paint_logo(ui, logo_rect, logo.as_ref(), &channel.name, 64.0);
                    ui.label(egui::RichText::new(&channel.name).size(28.0).strong().color(egui::Color32::WHITE));

                    if info_visible {
                        ui.add_space(8.0);
                        ui.label(egui::RichText::new(format!("{} · {} · {}", position, channel.country, channel.category)).color(egui::Color32::LIGHT_GRAY));
                        ui.label(egui::RichText::new(&channel.url).weak().small());
                        ui.label(
                            egui::RichText::new(if running { "● Player running" } else { "○ Player not running" })
                                .color(if running { egui::Color32::GREEN } else { egui::Color32::GRAY }),
                        );
                    }

                    if let Some(text) = &feedback {
                        ui.add_space(12.0);
                        ui.label(egui::RichText::new(text).size(24.0).color(egui::Color32::WHITE));
                    }

                    ui.add_space(24.0);
                    ui.horizontal(|ui| {
                        if ui.button("⬅ Back").clicked() {
                            action = Some(Action::Back);
                        }
                        if ui.button("⏮ Prev").clicked() {
                            action = Some(Action::Prev);
                        }
                        if ui.button("⏭ Next").clicked() {
                            action = Some(Action::Next);
                        }
                        if ui.button("🔉").clicked() {
                            action = Some(Action::VolDown);
                        }
                        if ui.button("🔊").clicked() {
                            action = Some(Action::VolUp);
                        }
                        if ui.button(if muted { "🔈 Unmute" } else { "🔇 Mute" }).clicked() {
                            action = Some(Action::Mute);
                        }
                        if ui.button("⟳ Restart player").clicked() {
                            action = Some(Action::Restart);
                        }
                        ui.label(egui::RichText::new(format!("Vol {}%", (volume * 100.0).round())).weak());
                    });

                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new("▲/▼ channel · ◀/▶ volume · M mute · Enter info · Esc back")
                            .weak()
                            .small(),
                    );
                    ui.label(
                        egui::RichText::new("Volume changes apply when the next stream starts")
                            .weak()
                            .small(),
                    );
                });
            });

        match action {
            Some(Action::Next) => self.switch_channel(Direction::Next),
            Some(Action::Prev) => self.switch_channel(Direction::Prev),
            Some(Action::VolDown) => self.adjust_volume(-self.config.volume_step),
            Some(Action::VolUp) => self.adjust_volume(self.config.volume_step),
            Some(Action::Mute) => self.toggle_mute(),
            Some(Action::Restart) => self.launch_current(),
            Some(Action::Back) => self.go_home(),
            None => {}
        }
    }

    fn show_settings(&mut self, ui: &mut egui::Ui) {
        let mut refresh = false;
        ui.horizontal(|ui| {
            ui.heading("Channel Store");
            ui.label(egui::RichText::new(format!("v{}", env!("CARGO_PKG_VERSION"))).weak());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add_enabled(!self.loading, egui::Button::new("🔄 Refresh")).clicked() {
                    refresh = true;
                }
            });
        });
        ui.separator();

        self.show_preferences(ui);

        if refresh {
            self.fetch_directory();
        }

        if self.loading || !self.selection_ready {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.spinner();
                ui.label("Loading channels...");
            });
            return;
        }

        if self.directory.is_empty() {
            let mut retry = false;
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(egui::RichText::new("Could not load the channel directory").strong());
                ui.label("Check your connection, then try again.");
                if ui.button("Retry").clicked() {
                    retry = true;
                }
            });
            if retry {
                self.fetch_directory();
            }
        }

        // Filters
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.filter.query)
                    .hint_text("Search channels...")
                    .desired_width(320.0),
            );
            if !self.filter.query.is_empty() && ui.small_button("✖").clicked() {
                self.filter.query.clear();
            }
        });

        let countries = directory::countries(&self.directory, &self.config.pinned_country);
        let categories = directory::categories(&self.directory);
        Self::filter_row(ui, "Country:", "country_chips", &countries, &mut self.filter.country);
        Self::filter_row(ui, "Category:", "category_chips", &categories, &mut self.filter.category);
        ui.separator();

        let mut actions = Vec::new();
        let mut wanted = Vec::new();
        let available = self.filter.available(&self.directory, &self.selection);
        let row_height = ui.text_style_height(&egui::TextStyle::Body) * 2.0 + 12.0;

        ui.columns(2, |cols| {
            // Left: available channels
            cols[0].label(egui::RichText::new(format!("AVAILABLE ({})", available.len())).strong().weak());
            egui::ScrollArea::vertical()
                .id_salt("available_scroll")
                .auto_shrink([false, false])
                .show_rows(&mut cols[0], row_height, available.len(), |ui, range| {
                    for channel in &available[range] {
                        let text = format!("＋  {}\n     {} | {}", channel.name, channel.country, channel.category);
                        let logo = self.logos.lookup(channel.logo.as_deref(), &mut wanted);
                        let response = ui.add_sized([ui.available_width(), row_height - 4.0], logo_row_button(text, logo));
                        if response.clicked() {
                            actions.push(StoreAction::Add((*channel).clone()));
                        }
                    }
                });

            // Right: selected lineup
            cols[1].label(egui::RichText::new(format!("SELECTED ({})", self.selection.len())).strong().weak());
            egui::ScrollArea::vertical()
                .id_salt("selected_scroll")
                .auto_shrink([false, false])
                .show(&mut cols[1], |ui| {
                    for (idx, channel) in self.selection.iter().enumerate() {
                        let is_moving = self.moving.as_deref() == Some(channel.id.as_str());
                        let hint = if is_moving {
                            "Moving... select new position"
                        } else if self.moving.is_some() {
                            "Click to place here"
                        } else {
                            "Click to move"
                        };
                        ui.horizontal(|ui| {
                            let stroke = if is_moving {
                                egui::Stroke::new(2.0, MOVING_COLOR)
                            } else {
                                egui::Stroke::NONE
                            };
                            let text = format!("{}. {}\n     {}", idx + 1, channel.name, hint);
                            let logo = self.logos.lookup(channel.logo.as_deref(), &mut wanted);
                            let response = ui.add_sized(
                                [ui.available_width() - 40.0, row_height - 4.0],
                                logo_row_button(text, logo).stroke(stroke),
                            );
                            if response.clicked() {
                                actions.push(StoreAction::Pick(channel.id.clone(), idx));
                            }
                            if ui.button("🗑").on_hover_text("Remove from lineup").clicked() {
                                actions.push(StoreAction::Remove(channel.id.clone()));
                            }
                        });
                    }
                });
        });

        self.request_logos(wanted);
        for action in actions {
            self.apply_store_action(action);
        }
    }

    fn filter_row(ui: &mut egui::Ui, label: &str, id: &str, values: &[String], selected: &mut String) {
        ui.horizontal(|ui| {
            ui.add_sized([80.0, 20.0], egui::Label::new(egui::RichText::new(label).weak()));
            egui::ScrollArea::horizontal()
                .id_salt(id)
                .max_height(28.0)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for value in values {
                            if ui.selectable_label(selected == value, value).clicked() {
                                *selected = value.clone();
                            }
                        }
                    });
                });
        });
    }

    fn show_preferences(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Preferences")
            .id_salt("preferences")
            .show(ui, |ui| {
                egui::Grid::new("prefs_grid").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
                    ui.label("Player:");
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.config.external_player)
                                .hint_text("ffplay, mpv, vlc...")
                                .desired_width(260.0),
                        )
                        .on_hover_text("Media player command or path.\nLeave empty for ffplay (default)");
                        if ui.button("📁").on_hover_text("Browse for player executable").clicked() {
                            if let Some(path) = rfd::FileDialog::new().set_title("Select Media Player").pick_file() {
                                self.config.external_player = path.display().to_string();
                            }
                        }
                    });
                    ui.end_row();

                    ui.label("Directory:");
                    ui.add(egui::TextEdit::singleline(&mut self.config.api_base).desired_width(320.0));
                    ui.end_row();

                    ui.label("Timeout (s):");
                    ui.add(egui::DragValue::new(&mut self.config.request_timeout_secs).range(5..=300));
                    ui.end_row();

                    ui.label("Pinned country:");
                    ui.add(egui::TextEdit::singleline(&mut self.config.pinned_country).desired_width(60.0));
                    ui.end_row();

                    ui.label("Grid columns:");
                    ui.add(egui::DragValue::new(&mut self.config.grid_columns).range(1..=8));
                    ui.end_row();

                    ui.label("Volume step:");
                    ui.add(egui::Slider::new(&mut self.config.volume_step, 0.05..=0.25));
                    ui.end_row();

                    ui.label("Launcher row:");
                    ui.horizontal(|ui| {
                        ui.checkbox(&mut self.config.home_sync_enabled, "Sync");
                        ui.add(egui::DragValue::new(&mut self.config.home_sync_limit).range(1..=50))
                            .on_hover_text("Channels shown in the launcher row");
                    });
                    ui.end_row();

                    ui.label("Window:");
                    ui.horizontal(|ui| {
                        ui.checkbox(&mut self.config.single_window_mode, "Single player window");
                        ui.checkbox(&mut self.config.dark_mode, "Dark mode");
                    });
                    ui.end_row();
                });

                if ui.button("💾 Save Preferences").clicked() {
                    self.config.save();
                    apply_visuals(ui.ctx(), &self.config);
                    self.status_message = "Preferences saved".to_string();
                    self.log("[INFO] Preferences saved");
                }
            });
    }

    fn show_reorder(&mut self, ui: &mut egui::Ui) {
        let mut save = false;
        ui.horizontal(|ui| {
            ui.heading("Reorder Channels");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("💾 Save Order").clicked() {
                    save = true;
                }
            });
        });
        ui.label(egui::RichText::new("Select a channel then use the arrows to move it (Shift+▲/▼ with the keyboard).").weak());
        ui.separator();

        let Some(state) = self.reorder.as_mut() else {
            return;
        };

        if state.channels.is_empty() {
            ui.label("No saved channels to reorder.");
        }

        let len = state.channels.len();
        let mut select = None;
        let mut move_up = None;
        let mut move_down = None;

        egui::ScrollArea::vertical()
            .id_salt("reorder_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (idx, channel) in state.channels.iter().enumerate() {
                    let is_selected = state.selected == Some(idx);
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(format!("{:>3}.", idx + 1)).monospace());
                        if ui.selectable_label(is_selected, &channel.name).clicked() {
                            select = Some(idx);
                        }
                        if ui.add_enabled(idx > 0, egui::Button::new("▲")).clicked() {
                            move_up = Some(idx);
                        }
                        if ui.add_enabled(idx + 1 < len, egui::Button::new("▼")).clicked() {
                            move_down = Some(idx);
                        }
                    });
                }
            });

        if let Some(idx) = select {
            state.selected = Some(idx);
        }
        if let Some(idx) = move_up {
            state.selected = state.channels.move_up(idx).or(Some(idx));
        }
        if let Some(idx) = move_down {
            state.selected = state.channels.move_down(idx).or(Some(idx));
        }

        if save {
            self.save_order();
        }
    }

    fn show_console(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Console Log");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("🗑 Clear").clicked() {
                    self.console_log.clear();
                    self.console_log.push(format!("[{}] Console cleared", timestamp_now()));
                }
            });
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.console_log {
                    let color = if line.contains("[ERROR]") {
                        egui::Color32::RED
                    } else if line.contains("[WARN]") {
                        egui::Color32::YELLOW
                    } else if line.contains("[INFO]") {
                        egui::Color32::LIGHT_BLUE
                    } else if line.contains("[PLAY]") {
                        egui::Color32::GREEN
                    } else {
                        egui::Color32::GRAY
                    };
                    ui.label(egui::RichText::new(line).monospace().color(color));
                }
            });
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };
        let mut close = false;

        egui::Window::new(dialog.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.add_space(10.0);
                ui.label(egui::RichText::new(&dialog.message).strong());
                ui.add_space(10.0);
                if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    close = true;
                }
            });

        if close {
            let return_home = dialog.return_home;
            self.dialog = None;
            if return_home {
                self.reorder = None;
                self.go_home();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn channel(id: &str) -> MergedChannel {
        MergedChannel {
            id: id.to_string(),
            name: id.to_uppercase(),
            logo: None,
            url: format!("http://stream/{}.m3u8", id),
            category: "News".to_string(),
            country: "TR".to_string(),
        }
    }

    fn app_with_lineup(dir: &Path) -> OwnTvApp {
        SelectionStore::new(FileStore::new(dir))
            .save(&[channel("a"), channel("b")])
            .unwrap();
        let launcher = LauncherFile::new(dir.join("home_channels.json"));
        OwnTvApp::with_storage(AppConfig::default(), FileStore::new(dir), Box::new(launcher))
    }

    fn press(key: egui::Key) -> egui::RawInput {
        egui::RawInput {
            events: vec![egui::Event::Key {
                key,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: egui::Modifiers::NONE,
            }],
            ..Default::default()
        }
    }

    /// One frame of the reorder screen, in the same order `update` runs it
    fn reorder_frame(app: &mut OwnTvApp, ctx: &egui::Context, input: egui::RawInput) {
        let _ = ctx.run(input, |ctx| {
            if app.dialog.is_none() {
                app.handle_reorder_keys(ctx);
            }
            app.show_dialog(ctx);
        });
    }

    #[test]
    fn test_enter_save_keeps_success_dialog_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_lineup(dir.path());
        app.open_reorder();
        let ctx = egui::Context::default();

        reorder_frame(&mut app, &ctx, press(egui::Key::Enter));
        assert_eq!(app.dialog.as_ref().map(|d| d.title.as_str()), Some("Success"));
        assert_eq!(app.screen, Screen::Reorder);

        reorder_frame(&mut app, &ctx, press(egui::Key::Enter));
        assert!(app.dialog.is_none());
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn test_enter_save_failure_shows_error_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_lineup(dir.path());
        app.open_reorder();

        // A plain file where the store directory should be makes every write fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        app.store = SelectionStore::new(FileStore::new(&blocker));

        let ctx = egui::Context::default();
        reorder_frame(&mut app, &ctx, press(egui::Key::Enter));

        let dialog = app.dialog.as_ref().unwrap();
        assert_eq!(dialog.title, "Error");
        assert_eq!(dialog.message, "Failed to save order.");
        assert_eq!(app.screen, Screen::Reorder);
        assert!(app.reorder.is_some());
    }

    #[test]
    fn test_shift_arrow_moves_entry_in_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_lineup(dir.path());
        app.open_reorder();
        let ctx = egui::Context::default();

        let mut input = press(egui::Key::ArrowDown);
        input.modifiers = egui::Modifiers::SHIFT;
        reorder_frame(&mut app, &ctx, input);

        let state = app.reorder.as_ref().unwrap();
        let ids: Vec<&str> = state.channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(state.selected, Some(1));
        // Saved lineup is untouched until "Save Order"
        assert_eq!(app.selection.as_slice()[0].id, "a");
    }
}
