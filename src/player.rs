//! Playback session state and external player launching

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::models::MergedChannel;

/// Direction for channel switching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// What is playing and how loud.
///
/// Channel switching wraps around the lineup. Volume lives in `[0, 1]`; muting
/// remembers the last level so unmuting restores it.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    channels: Vec<MergedChannel>,
    index: usize,
    volume: f32,
    last_volume: f32,
    muted: bool,
    info_until: Option<Instant>,
    info_duration: Duration,
}

impl PlaybackSession {
    pub fn new(channels: Vec<MergedChannel>, index: usize, info_duration: Duration) -> Self {
        let index = if channels.is_empty() { 0 } else { index.min(channels.len() - 1) };
        let mut session = Self {
            channels,
            index,
            volume: 1.0,
            last_volume: 1.0,
            muted: false,
            info_until: None,
            info_duration,
        };
        session.show_info();
        session
    }

    pub fn current(&self) -> Option<&MergedChannel> {
        self.channels.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn change_channel(&mut self, direction: Direction) -> Option<&MergedChannel> {
        let len = self.channels.len();
        if len == 0 {
            return None;
        }
        self.index = match direction {
            Direction::Next => (self.index + 1) % len,
            Direction::Prev => (self.index + len - 1) % len,
        };
        self.show_info();
        self.current()
    }

    /// Effective volume handed to the player
    pub fn volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn adjust_volume(&mut self, delta: f32) -> f32 {
        let start = self.volume();
        self.set_volume(start + delta)
    }

    pub fn set_volume(&mut self, value: f32) -> f32 {
        self.volume = value.clamp(0.0, 1.0);
        if self.muted && self.volume > 0.0 {
            self.muted = false;
        }
        self.volume()
    }

    pub fn toggle_mute(&mut self) -> bool {
        if self.muted {
            self.volume = self.last_volume;
            self.muted = false;
        } else {
            self.last_volume = self.volume;
            self.volume = 0.0;
            self.muted = true;
        }
        self.muted
    }

    pub fn show_info(&mut self) {
        self.info_until = Some(Instant::now() + self.info_duration);
    }

    pub fn toggle_info(&mut self) {
        if self.info_visible() {
            self.info_until = None;
        } else {
            self.show_info();
        }
    }

    pub fn info_visible(&self) -> bool {
        self.info_until.is_some_and(|t| Instant::now() < t)
    }
}

/// Resolve the configured player to an executable
pub fn resolve_player(configured: &str) -> String {
    let player = if configured.trim().is_empty() {
        "ffplay".to_string()
    } else {
        configured.trim().to_string()
    };

    #[cfg(target_os = "windows")]
    {
        let known: &[&str] = match player.to_lowercase().as_str() {
            "vlc" | "vlc.exe" => &[
                r"C:\Program Files\VideoLAN\VLC\vlc.exe",
                r"C:\Program Files (x86)\VideoLAN\VLC\vlc.exe",
            ],
            "mpv" | "mpv.exe" => &[r"C:\Program Files\mpv\mpv.exe", r"C:\mpv\mpv.exe"],
            "ffplay" | "ffplay.exe" => &[r"C:\ffmpeg\bin\ffplay.exe", r"C:\Program Files\ffmpeg\bin\ffplay.exe"],
            _ => &[],
        };
        if let Some(path) = known.iter().find(|p| std::path::Path::new(p).exists()) {
            return path.to_string();
        }
    }

    player
}

/// Command-line arguments for `player` playing `channel` at `volume` (0..1)
pub fn player_args(player: &str, channel: &MergedChannel, volume: f32) -> Vec<String> {
    let lower = player.to_lowercase();
    let percent = (volume.clamp(0.0, 1.0) * 100.0).round() as u32;
    let title = format!("OwnTV - {}", channel.name);

    if lower.contains("ffplay") {
        let mut args = vec![
            channel.url.clone(),
            "-autoexit".to_string(),
            "-window_title".to_string(),
            title,
            "-volume".to_string(),
            percent.to_string(),
        ];
        if channel.url.starts_with("http") {
            args.extend([
                "-reconnect".to_string(),
                "1".to_string(),
                "-reconnect_streamed".to_string(),
                "1".to_string(),
            ]);
        }
        args
    } else if lower.contains("mpv") {
        vec![
            channel.url.clone(),
            format!("--title={}", title),
            format!("--volume={}", percent),
            "--cache=yes".to_string(),
            "--keep-open=no".to_string(),
            "--ytdl=no".to_string(),
        ]
    } else if lower.contains("vlc") {
        vec![
            channel.url.clone(),
            format!("--meta-title={}", title),
            format!("--gain={:.2}", volume.clamp(0.0, 1.0)),
            "--play-and-exit".to_string(),
        ]
    } else {
        vec![channel.url.clone()]
    }
}

/// Messages from a running player process
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Log(String),
    Exited { code: Option<i32>, channel: String },
}

/// External media player process, at most one in single-window mode
#[derive(Default)]
pub struct ExternalPlayer {
    current: Option<Child>,
}

impl ExternalPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&mut self) -> bool {
        match self.current.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => true,
            Some(_) => {
                self.current = None;
                false
            }
            None => false,
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.current.take() {
            let _ = child.kill();
            let _ = child.wait(); // Reap the process
        }
    }

    /// Launch `player` on `channel`. Stderr lines and abnormal exits are sent to `events`.
    pub fn play<E>(
        &mut self,
        player: &str,
        channel: &MergedChannel,
        volume: f32,
        single_window: bool,
        events: Sender<E>,
    ) -> Result<u32>
    where
        E: From<PlayerEvent> + Send + 'static,
    {
        if single_window {
            self.stop();
        }

        let mut cmd = Command::new(player);
        cmd.args(player_args(player, channel, volume));

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            if player.to_lowercase().contains("ffplay") {
                cmd.creation_flags(CREATE_NO_WINDOW);
            }
        }

        cmd.stderr(Stdio::piped());
        cmd.stdout(Stdio::null());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Player(format!("failed to launch '{}': {}", player, e)))?;
        let pid = child.id();
        tracing::info!("Player '{}' started for {} (PID {})", player, channel.id, pid);

        if let Some(stderr) = child.stderr.take() {
            let sender = events.clone();
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                    if !line.trim().is_empty() {
                        let _ = sender.send(PlayerEvent::Log(format!("[PLAYER] {}", line)).into());
                    }
                }
            });
        }

        if single_window {
            self.current = Some(child);
        } else {
            let channel_name = channel.name.clone();
            thread::spawn(move || match child.wait() {
                Ok(status) if !status.success() => {
                    let _ = events.send(PlayerEvent::Exited { code: status.code(), channel: channel_name }.into());
                }
                Ok(_) => {}
                Err(e) => {
                    let _ = events.send(PlayerEvent::Log(format!("[ERROR] Failed to wait for player: {}", e)).into());
                }
            });
        }

        Ok(pid)
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lineup() -> Vec<MergedChannel> {
        ["a", "b", "c"]
            .iter()
            .map(|id| MergedChannel {
                id: id.to_string(),
                name: id.to_uppercase(),
                logo: None,
                url: format!("http://stream/{}.m3u8", id),
                category: "News".to_string(),
                country: "TR".to_string(),
            })
            .collect()
    }

    fn session() -> PlaybackSession {
        PlaybackSession::new(lineup(), 0, Duration::from_secs(3))
    }

    #[test]
    fn test_channel_switch_wraps() {
        let mut s = session();
        assert_eq!(s.change_channel(Direction::Prev).unwrap().id, "c");
        assert_eq!(s.change_channel(Direction::Next).unwrap().id, "a");
        assert_eq!(s.change_channel(Direction::Next).unwrap().id, "b");
    }

    #[test]
    fn test_empty_lineup() {
        let mut s = PlaybackSession::new(Vec::new(), 4, Duration::from_secs(3));
        assert!(s.current().is_none());
        assert!(s.change_channel(Direction::Next).is_none());
    }

    #[test]
    fn test_start_index_is_clamped() {
        let s = PlaybackSession::new(lineup(), 10, Duration::from_secs(3));
        assert_eq!(s.current().unwrap().id, "c");
    }

    #[test]
    fn test_volume_clamps() {
        let mut s = session();
        assert_eq!(s.adjust_volume(0.1), 1.0);
        s.set_volume(0.05);
        assert_eq!(s.adjust_volume(-0.1), 0.0);
    }

    #[test]
    fn test_mute_restores_volume() {
        let mut s = session();
        s.set_volume(0.6);
        assert!(s.toggle_mute());
        assert_eq!(s.volume(), 0.0);
        assert!(!s.toggle_mute());
        assert!((s.volume() - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_raising_volume_unmutes() {
        let mut s = session();
        s.set_volume(0.8);
        s.toggle_mute();
        let v = s.adjust_volume(0.1);
        assert!(!s.is_muted());
        assert!((v - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_info_overlay_toggles() {
        let mut s = session();
        assert!(s.info_visible());
        s.toggle_info();
        assert!(!s.info_visible());
        let expired = PlaybackSession::new(lineup(), 0, Duration::ZERO);
        assert!(!expired.info_visible());
    }

    #[test]
    fn test_player_args() {
        let ch = &lineup()[0];
        let ffplay = player_args("ffplay", ch, 0.5);
        assert_eq!(ffplay[0], ch.url);
        assert!(ffplay.windows(2).any(|w| w[0] == "-volume" && w[1] == "50"));

        let mpv = player_args("/usr/bin/mpv", ch, 1.0);
        assert!(mpv.contains(&"--volume=100".to_string()));

        assert_eq!(player_args("celluloid-x", ch, 1.0), vec![ch.url.clone()]);
    }

    #[test]
    fn test_resolve_default_player() {
        assert!(resolve_player("  ").contains("ffplay"));
        #[cfg(not(target_os = "windows"))]
        assert_eq!(resolve_player("mpv"), "mpv");
    }
}
