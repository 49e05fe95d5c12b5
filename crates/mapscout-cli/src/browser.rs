//! `PageSession` over a headless Chrome tab.
//!
//! `headless_chrome` is a blocking driver, so every call runs on the tokio
//! blocking pool against a shared `Arc<Tab>`. Scripts are wrapped so their
//! return value comes back as a JSON string, which keeps arrays and objects
//! intact across the protocol boundary.

use std::ffi::OsStr;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use mapscout_core::AppConfig;
use mapscout_scraper::{ElementSnapshot, PageSession, SessionError, SessionLauncher};
use serde_json::Value;

const WINDOW_SIZE: (u32, u32) = (1366, 900);
/// The driver drops its connection after this long without a command.
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Starts one Chrome instance per run.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
    chrome_path: Option<PathBuf>,
    lang: String,
}

impl ChromeLauncher {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            lang: config.browser_lang.clone(),
        }
    }

    pub(crate) fn launch_args(&self) -> Vec<String> {
        vec![
            format!("--lang={}", self.lang),
            "--disable-notifications".to_string(),
            // Hides the automation infobar and `navigator.webdriver`.
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-infobars".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ]
    }
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> impl Future<Output = Result<ChromeSession, SessionError>> + Send {
        let headless = self.headless;
        let path = self.chrome_path.clone();
        let args = self.launch_args();
        async move {
            tokio::task::spawn_blocking(move || start_browser(headless, path, &args))
                .await
                .map_err(|e| SessionError::Launch(format!("launcher task failed: {e}")))?
        }
    }
}

fn start_browser(
    headless: bool,
    path: Option<PathBuf>,
    args: &[String],
) -> Result<ChromeSession, SessionError> {
    let args: Vec<&OsStr> = args.iter().map(|a| OsStr::new(a.as_str())).collect();
    let options = LaunchOptions::default_builder()
        .headless(headless)
        .path(path)
        .window_size(Some(WINDOW_SIZE))
        .idle_browser_timeout(IDLE_TIMEOUT)
        .args(args)
        .build()
        .map_err(|e| SessionError::Launch(format!("invalid launch options: {e}")))?;

    let browser = Browser::new(options).map_err(|e| SessionError::Launch(format!("{e:#}")))?;
    let tab = browser
        .new_tab()
        .map_err(|e| SessionError::Launch(format!("could not open tab: {e:#}")))?;
    tracing::debug!(headless, "browser started");

    Ok(ChromeSession {
        _browser: browser,
        tab,
    })
}

/// One Chrome tab. Dropping the session shuts the browser down.
pub struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

/// Run a blocking driver call off the async runtime.
async fn on_tab<T, F>(tab: Arc<Tab>, op: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || op(&tab)).await {
        Ok(result) => result.map_err(|e| format!("{e:#}")),
        Err(e) => Err(format!("driver task failed: {e}")),
    }
}

/// Wraps a function body so its return value arrives as JSON text.
pub(crate) fn json_expression(body: &str) -> String {
    format!("JSON.stringify((function() {{\n{body}\n}})())")
}

fn evaluate_json(tab: &Tab, body: &str) -> anyhow::Result<Value> {
    let remote = tab.evaluate(&json_expression(body), false)?;
    match remote.value {
        Some(Value::String(json)) => Ok(serde_json::from_str(&json)?),
        _ => Ok(Value::Null),
    }
}

/// Snapshot script for every element matching `selector`.
pub(crate) fn element_query(selector: &str) -> String {
    let quoted = Value::String(selector.to_owned()).to_string();
    format!(
        r"var nodes = document.querySelectorAll({quoted});
return Array.prototype.map.call(nodes, function (el) {{
  return {{
    text: (el.innerText || el.textContent || '').trim(),
    aria_label: el.getAttribute('aria-label'),
    href: el.href || el.getAttribute('href')
  }};
}});"
    )
}

const VISIBLE_TEXT: &str = "return document.body ? document.body.innerText : '';";
const HISTORY_BACK: &str = "history.back(); return true;";

impl PageSession for ChromeSession {
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), SessionError>> + Send {
        let tab = Arc::clone(&self.tab);
        let url = url.to_owned();
        async move {
            let target = url.clone();
            on_tab(tab, move |tab| {
                tab.navigate_to(&target)?.wait_until_navigated()?;
                Ok(())
            })
            .await
            .map_err(|reason| SessionError::Navigation { url, reason })
        }
    }

    fn read_visible_text(&self) -> impl Future<Output = Result<String, SessionError>> + Send {
        let tab = Arc::clone(&self.tab);
        async move {
            let value = on_tab(tab, |tab| evaluate_json(tab, VISIBLE_TEXT))
                .await
                .map_err(|reason| SessionError::Script { reason })?;
            Ok(value.as_str().unwrap_or_default().to_owned())
        }
    }

    fn evaluate_script(
        &self,
        script: &str,
    ) -> impl Future<Output = Result<Value, SessionError>> + Send {
        let tab = Arc::clone(&self.tab);
        let script = script.to_owned();
        async move {
            on_tab(tab, move |tab| evaluate_json(tab, &script))
                .await
                .map_err(|reason| SessionError::Script { reason })
        }
    }

    fn find_elements(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<ElementSnapshot>, SessionError>> + Send {
        let tab = Arc::clone(&self.tab);
        let selector = selector.to_owned();
        async move {
            let script = element_query(&selector);
            let value = on_tab(tab, move |tab| evaluate_json(tab, &script))
                .await
                .map_err(|reason| SessionError::Element {
                    selector: selector.clone(),
                    reason,
                })?;
            if value.is_null() {
                return Ok(Vec::new());
            }
            serde_json::from_value(value).map_err(|e| SessionError::Element {
                selector,
                reason: e.to_string(),
            })
        }
    }

    fn go_back(&self) -> impl Future<Output = Result<(), SessionError>> + Send {
        let tab = Arc::clone(&self.tab);
        async move {
            on_tab(tab, |tab| evaluate_json(tab, HISTORY_BACK).map(|_| ()))
                .await
                .map_err(|reason| SessionError::Navigation {
                    url: "history.back()".to_string(),
                    reason,
                })
        }
    }
}
