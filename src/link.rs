//! Opening external links in the system browser.

use std::process::{Command, Stdio};

use crate::error::LinkError;

/// Something that can show a URL to the user outside the app.
pub trait LinkOpener {
    fn open(&mut self, url: &str) -> Result<(), LinkError>;
}

/// Hands URLs to the platform's default handler and does not wait for it.
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    /// Program and leading arguments for the current platform.
    fn launcher() -> Option<(&'static str, &'static [&'static str])> {
        if cfg!(target_os = "macos") {
            Some(("open", &[]))
        } else if cfg!(target_os = "windows") {
            Some(("cmd", &["/C", "start", ""]))
        } else if cfg!(unix) {
            Some(("xdg-open", &[]))
        } else {
            None
        }
    }
}

impl LinkOpener for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<(), LinkError> {
        let (program, args) = Self::launcher().ok_or(LinkError::Unsupported)?;
        log::info!("[link] opening {url}");
        Command::new(program)
            .args(args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| LinkError::Spawn { program, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_desktop_platform_has_a_launcher() {
        if cfg!(any(target_os = "macos", target_os = "windows", unix)) {
            assert!(SystemBrowser::launcher().is_some());
        }
    }
}
