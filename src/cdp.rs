//! Chrome DevTools Protocol adapter implementation

use crate::{CaptureEngine, EngineConfig, Error, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// Extra Chrome flags needed to render local documents that pull in sibling
/// files or cross-origin diagram assets from a `file://` page.
const CHROME_ARGS: [&str; 3] = [
    "--allow-file-access-from-files",
    "--disable-web-security",
    "--disable-dev-shm-usage",
];

/// CDP-based engine implementation (uses the `headless_chrome` crate)
///
/// This adapter launches a headless Chrome instance and drives a single tab.
/// The Chrome child process is killed when the engine is dropped.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
}

impl CdpEngine {
    /// Launch headless Chrome and open a tab sized to the configured viewport.
    pub fn launch(config: EngineConfig) -> Result<Self> {
        let args: Vec<&OsStr> = CHROME_ARGS.iter().map(|a| OsStr::new(*a)).collect();

        // Configure headless Chrome launch options
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .idle_browser_timeout(Duration::from_millis(config.idle_timeout_ms))
            .args(args)
            .build()
            .map_err(|e| Error::LaunchError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::LaunchError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::LaunchError(format!("Failed to create tab: {}", e)))?;

        info!(
            "launched headless Chrome ({}x{}, sandbox {})",
            config.viewport.width,
            config.viewport.height,
            if config.sandbox { "on" } else { "off" }
        );

        Ok(Self { browser, tab })
    }
}

impl CaptureEngine for CdpEngine {
    fn load_url(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        debug!("navigated to {}", url);
        Ok(())
    }

    fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| Error::ElementTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
                detail: e.to_string(),
            })
    }

    fn capture_element_png(&mut self, selector: &str) -> Result<Vec<u8>> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| Error::ElementNotFound(format!("{} ({})", selector, e)))?;

        element
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png)
            .map_err(|e| Error::CaptureError(format!("{}: {}", selector, e)))
    }

    fn close(self) -> Result<()> {
        // Drop the tab before the browser so the child process goes down last.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
