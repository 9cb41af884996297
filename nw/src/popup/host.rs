//! Window hosts that actually put popups on screen

use std::collections::HashMap;
use std::io::Write;

use colored::Colorize;
use eyre::Result;
use tracing::debug;

use super::geometry::Rect;
use crate::domain::Notification;

/// Opens, moves and closes popup windows identified by slot id
pub trait WindowHost: Send {
    fn open(&mut self, slot: u64, notification: &Notification, rect: Rect) -> Result<()>;

    fn place(&mut self, slot: u64, rect: Rect);

    /// Close a window; closing an unknown slot is a no-op
    fn close(&mut self, slot: u64);
}

/// Renders popups as text blocks on a terminal
pub struct TerminalHost<W: Write + Send = std::io::Stdout> {
    out: W,
    titles: HashMap<u64, String>,
}

impl TerminalHost {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            titles: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, slot: u64, notification: &Notification) -> std::io::Result<()> {
        let project = if notification.project.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notification.project)
        };
        writeln!(
            self.out,
            "{} {}{}",
            format!("#{slot}").dimmed(),
            notification.title.bold().cyan(),
            project.dimmed()
        )?;
        for line in notification.message.lines() {
            writeln!(self.out, "  {}", line)?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> WindowHost for TerminalHost<W> {
    fn open(&mut self, slot: u64, notification: &Notification, rect: Rect) -> Result<()> {
        debug!(slot, %rect, id = %notification.id, "TerminalHost::open: called");
        self.render(slot, notification)?;
        self.titles.insert(slot, notification.title.clone());
        Ok(())
    }

    fn place(&mut self, slot: u64, rect: Rect) {
        debug!(slot, %rect, "TerminalHost::place: called");
    }

    fn close(&mut self, slot: u64) {
        debug!(slot, "TerminalHost::close: called");
        if let Some(title) = self.titles.remove(&slot) {
            let _ = writeln!(self.out, "{} {}", format!("#{slot}").dimmed(), format!("closed: {title}").dimmed());
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// One call made against a [`RecordingHost`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostCall {
        Open { slot: u64, id: String, rect: Rect },
        Place { slot: u64, rect: Rect },
        Close { slot: u64 },
    }

    /// Records every call; `fail_open` makes the next opens fail
    #[derive(Debug, Default)]
    pub struct RecordingHost {
        pub calls: Vec<HostCall>,
        pub fail_open: bool,
    }

    impl RecordingHost {
        pub fn closes(&self) -> Vec<u64> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    HostCall::Close { slot } => Some(*slot),
                    _ => None,
                })
                .collect()
        }
    }

    impl WindowHost for RecordingHost {
        fn open(&mut self, slot: u64, notification: &Notification, rect: Rect) -> Result<()> {
            if self.fail_open {
                return Err(eyre::eyre!("no display"));
            }
            self.calls.push(HostCall::Open {
                slot,
                id: notification.id.clone(),
                rect,
            });
            Ok(())
        }

        fn place(&mut self, slot: u64, rect: Rect) {
            self.calls.push(HostCall::Place { slot, rect });
        }

        fn close(&mut self, slot: u64) {
            self.calls.push(HostCall::Close { slot });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::popup::StackLayout;

    #[test]
    fn test_terminal_host_renders_and_closes() {
        colored::control::set_override(false);
        let mut host = TerminalHost::new(Vec::new());
        let mut notification = Notification::new("n-1", "Build finished", "all green\nin 42s");
        notification.project = "ci".to_string();

        host.open(3, &notification, StackLayout::default().rect_for(0)).unwrap();
        host.close(3);
        host.close(3);

        let text = String::from_utf8(host.into_inner()).unwrap();
        assert_eq!(text, "#3 Build finished [ci]\n  all green\n  in 42s\n#3 closed: Build finished\n");
    }
}
