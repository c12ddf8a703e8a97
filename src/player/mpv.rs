use std::process::{Child, Command, Stdio};

use tracing::{debug, info};

use crate::api::StreamInfo;
use crate::config::PlayerConfig;
use crate::error::{Error, Result};

pub struct MpvPlayer {
    command: String,
    args: Vec<String>,
    preferred_subtitle: String,
    child: Option<Child>,
}

impl MpvPlayer {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        preferred_subtitle: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            preferred_subtitle: preferred_subtitle.into(),
            child: None,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(
            &config.command,
            config.args.clone(),
            &config.preferred_subtitle,
        )
    }

    /// Full argument list for `stream`: configured args, the first source,
    /// request headers, then every subtitle track.
    pub fn build_args(&self, stream: &StreamInfo) -> Result<Vec<String>> {
        let source = stream
            .sources
            .first()
            .ok_or_else(|| Error::PlayerLaunch("stream has no sources".to_string()))?;

        let mut args = self.args.clone();
        args.push(source.url.clone());

        if let Some(referer) = &stream.referer {
            args.push(format!("--http-header-fields=Referer: {}", referer));
        }
        if let Some(user_agent) = &stream.user_agent {
            args.push(format!("--user-agent={}", user_agent));
        }

        // Seek-preview sprites can still slip through under a language label.
        let subtitles: Vec<_> = stream
            .subtitles
            .iter()
            .filter(|s| !s.url.contains("thumbnails"))
            .collect();

        for sub in &subtitles {
            args.push(format!("--sub-file={}", sub.url));
        }

        if !subtitles.is_empty() {
            let preferred = self.preferred_subtitle.to_lowercase();
            // mpv numbers external tracks from 1 in the order they were added.
            if let Some(pos) = subtitles
                .iter()
                .position(|s| !preferred.is_empty() && s.lang.to_lowercase().contains(&preferred))
            {
                args.push(format!("--sid={}", pos + 1));
            }
            args.push("--sub-visibility=yes".to_string());
        }

        Ok(args)
    }

    pub fn play(&mut self, stream: &StreamInfo) -> Result<()> {
        let args = self.build_args(stream)?;

        let mut cmd = Command::new(&self.command);

        // Keep player output off the TUI
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd.args(&args);

        debug!(command = %self.command, args = ?args, "Launching player");

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::PlayerNotFound(self.command.clone())
            } else {
                Error::PlayerLaunch(e.to_string())
            }
        })?;

        info!(
            sources = stream.sources.len(),
            subtitles = stream.subtitles.len(),
            "Playback started"
        );
        self.child = Some(child);
        Ok(())
    }

    /// Wait for the player to exit and return whether it exited cleanly
    pub fn wait(&mut self) -> Result<bool> {
        if let Some(ref mut child) = self.child {
            let status = child.wait()?;
            self.child = None;
            Ok(status.success())
        } else {
            Ok(true)
        }
    }
}

impl Default for MpvPlayer {
    fn default() -> Self {
        Self::from_config(&PlayerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Source, Subtitle};

    fn stream() -> StreamInfo {
        StreamInfo {
            referer: Some("https://aniwatch.to/".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
            sources: vec![
                Source::classify("https://cdn.test/master.m3u8".to_string(), None),
                Source::classify("https://cdn.test/backup.mp4".to_string(), None),
            ],
            subtitles: vec![
                Subtitle {
                    url: "https://cdn.test/es.vtt".to_string(),
                    lang: "Spanish".to_string(),
                },
                Subtitle {
                    url: "https://cdn.test/thumbnails.vtt".to_string(),
                    lang: "Unknown".to_string(),
                },
                Subtitle {
                    url: "https://cdn.test/en.vtt".to_string(),
                    lang: "English".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_build_args_full_stream() {
        let player = MpvPlayer::new("mpv", vec!["--cache=yes".to_string()], "english");
        let args = player.build_args(&stream()).unwrap();
        assert_eq!(
            args,
            vec![
                "--cache=yes",
                "https://cdn.test/master.m3u8",
                "--http-header-fields=Referer: https://aniwatch.to/",
                "--user-agent=Mozilla/5.0",
                "--sub-file=https://cdn.test/es.vtt",
                "--sub-file=https://cdn.test/en.vtt",
                "--sid=2",
                "--sub-visibility=yes",
            ]
        );
    }

    #[test]
    fn test_build_args_without_headers_or_subs() {
        let player = MpvPlayer::new("mpv", vec![], "English");
        let stream = StreamInfo {
            sources: vec![Source::classify("https://cdn.test/a.mp4".to_string(), None)],
            ..StreamInfo::default()
        };
        assert_eq!(
            player.build_args(&stream).unwrap(),
            vec!["https://cdn.test/a.mp4"]
        );
    }

    #[test]
    fn test_build_args_no_preferred_match() {
        let player = MpvPlayer::new("mpv", vec![], "Portuguese");
        let args = player.build_args(&stream()).unwrap();
        assert!(!args.iter().any(|a| a.starts_with("--sid=")));
        assert!(args.contains(&"--sub-visibility=yes".to_string()));
    }

    #[test]
    fn test_build_args_requires_source() {
        let player = MpvPlayer::default();
        assert!(matches!(
            player.build_args(&StreamInfo::default()),
            Err(Error::PlayerLaunch(_))
        ));
    }

    #[test]
    fn test_missing_binary_is_not_found() {
        let mut player = MpvPlayer::new("kanshi-no-such-player", vec![], "English");
        let stream = StreamInfo {
            sources: vec![Source::classify("https://cdn.test/a.mp4".to_string(), None)],
            ..StreamInfo::default()
        };
        assert!(matches!(
            player.play(&stream),
            Err(Error::PlayerNotFound(_))
        ));
        assert!(player.child.is_none());
    }
}
