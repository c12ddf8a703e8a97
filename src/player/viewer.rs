use std::io::Write;
use std::process::{Child, Command, Stdio};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::api::ChapterPages;
use crate::config::{ViewerCommand, ViewerConfig};
use crate::error::{Error, Result};

/// Replaced with the path of the page list file.
const LIST_PLACEHOLDER: &str = "{list}";
/// Replaced with the first page URL, for viewers that take a single target.
const FIRST_PLACEHOLDER: &str = "{first}";

/// Hands a chapter's pages to the first external image viewer that launches.
///
/// Page URLs are written one per line to a temporary list. Every viewer gets
/// the list on stdin; its arguments may also reference it through `{list}`.
pub struct ImageViewer {
    commands: Vec<ViewerCommand>,
}

/// A launched viewer. The page list lives until the viewer exits.
pub struct OpenViewer {
    child: Child,
    command: String,
    _list: NamedTempFile,
}

impl OpenViewer {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn wait(mut self) -> Result<bool> {
        let status = self.child.wait()?;
        debug!(command = %self.command, status = %status, "Viewer exited");
        Ok(status.success())
    }
}

impl ImageViewer {
    pub fn new(commands: Vec<ViewerCommand>) -> Self {
        Self { commands }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.commands.clone())
    }

    pub fn open(&self, pages: &ChapterPages) -> Result<OpenViewer> {
        let urls = pages.resolved_urls();
        if urls.is_empty() {
            return Err(Error::SchemaMismatch("chapter has no pages".to_string()));
        }

        let mut list = NamedTempFile::new()?;
        for url in &urls {
            writeln!(list, "{}", url)?;
        }
        list.flush()?;

        let list_path = list.path().to_string_lossy().into_owned();

        for viewer in &self.commands {
            let args = expand_args(&viewer.args, &list_path, &urls[0]);

            let mut cmd = Command::new(&viewer.command);
            cmd.args(&args);
            cmd.stdin(Stdio::from(list.reopen()?));
            cmd.stdout(Stdio::null());
            cmd.stderr(Stdio::null());

            match cmd.spawn() {
                Ok(child) => {
                    info!(command = %viewer.command, pages = urls.len(), "Viewer launched");
                    return Ok(OpenViewer {
                        child,
                        command: viewer.command.clone(),
                        _list: list,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(command = %viewer.command, "Viewer not installed");
                }
                Err(e) => {
                    warn!(command = %viewer.command, error = %e, "Viewer failed to launch");
                }
            }
        }

        let tried = self
            .commands
            .iter()
            .map(|c| c.command.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::ViewerNotFound(tried))
    }
}

fn expand_args(args: &[String], list_path: &str, first_url: &str) -> Vec<String> {
    args.iter()
        .map(|arg| {
            arg.replace(LIST_PLACEHOLDER, list_path)
                .replace(FIRST_PLACEHOLDER, first_url)
        })
        .collect()
}

impl Default for ImageViewer {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> ChapterPages {
        ChapterPages {
            page_urls: vec!["1.png".to_string(), "https://abs.test/2.png".to_string()],
            referer: None,
            base_url: Some("https://cdn.test/data/".to_string()),
        }
    }

    fn viewer(command: &str, args: &[&str]) -> ViewerCommand {
        ViewerCommand {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_expand_args() {
        let args = vec!["-f".to_string(), "{list}".to_string(), "--".to_string()];
        assert_eq!(
            expand_args(&args, "/tmp/x", "https://a"),
            vec!["-f", "/tmp/x", "--"]
        );
        assert_eq!(
            expand_args(&["{first}".to_string()], "/tmp/x", "https://a"),
            vec!["https://a"]
        );
    }

    #[test]
    fn test_no_viewer_installed() {
        let viewer = ImageViewer::new(vec![
            viewer("kanshi-missing-a", &[]),
            viewer("kanshi-missing-b", &["{list}"]),
        ]);
        match viewer.open(&pages()) {
            Err(Error::ViewerNotFound(tried)) => {
                assert_eq!(tried, "kanshi-missing-a, kanshi-missing-b")
            }
            other => panic!("unexpected: {:?}", other.map(|v| v.command().to_string())),
        }
    }

    #[test]
    fn test_empty_chapter_rejected() {
        let viewer = ImageViewer::default();
        assert!(matches!(
            viewer.open(&ChapterPages::default()),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_falls_through_to_installed_viewer() {
        // `cat` reads the list from stdin and exits.
        let viewer = ImageViewer::new(vec![viewer("kanshi-missing", &[]), viewer("cat", &[])]);
        let open = viewer.open(&pages()).unwrap();
        assert_eq!(open.command(), "cat");
        assert!(open.wait().unwrap());
    }
}
