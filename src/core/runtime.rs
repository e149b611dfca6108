//! Host-app runtime detection for the environment badge.
//!
//! The environment is resolved once per request by the
//! [`DetectedRuntime`](crate::core::extractors::DetectedRuntime) extractor and
//! handed to whatever renders the badge. It is display-only and never affects
//! what a caller may do.

use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use serde::{Deserialize, Serialize};

/// Explicit override header, takes precedence over the user agent
pub const RUNTIME_HEADER: &str = "x-nexus-runtime";

/// User-agent fragment identifying the host app by default
pub const DEFAULT_HOST_APP_MARKER: &str = "WorldApp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeEnvironment {
    /// Running inside the host app's embedded webview
    HostApp,
    Browser,
}

/// Resolves a [`RuntimeEnvironment`] from request headers and labels it
#[derive(Debug, Clone)]
pub struct RuntimeDetector {
    host_app_marker: String,
    /// Shown in the host-app badge
    host_app_name: String,
}

impl RuntimeDetector {
    /// Detector for `host_app_marker`; the badge names the app after the
    /// marker with its words split (`WorldApp` → `World App`)
    pub fn new(host_app_marker: impl Into<String>) -> Self {
        let host_app_marker = host_app_marker.into();
        Self {
            host_app_name: display_name(&host_app_marker),
            host_app_marker,
        }
    }

    pub fn with_host_app_name(mut self, name: impl Into<String>) -> Self {
        self.host_app_name = name.into();
        self
    }

    pub fn badge(&self, environment: RuntimeEnvironment) -> String {
        match environment {
            RuntimeEnvironment::HostApp if !self.host_app_name.is_empty() => {
                format!("Running in {}", self.host_app_name)
            }
            RuntimeEnvironment::HostApp => "Running in host app".to_string(),
            RuntimeEnvironment::Browser => "Running in browser".to_string(),
        }
    }

    pub fn detect(&self, headers: &HeaderMap) -> RuntimeEnvironment {
        let explicit = headers
            .get(RUNTIME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase());
        match explicit.as_deref() {
            Some("host_app") => return RuntimeEnvironment::HostApp,
            Some("browser") => return RuntimeEnvironment::Browser,
            _ => {}
        }

        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !self.host_app_marker.is_empty() && user_agent.contains(&self.host_app_marker) {
            RuntimeEnvironment::HostApp
        } else {
            RuntimeEnvironment::Browser
        }
    }
}

fn display_name(marker: &str) -> String {
    let mut name = String::with_capacity(marker.len() + 2);
    let mut prev_lower = false;
    for c in marker.chars() {
        if c.is_uppercase() && prev_lower {
            name.push(' ');
        }
        prev_lower = c.is_lowercase();
        name.push(c);
    }
    name
}

impl Default for RuntimeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_APP_MARKER)
    }
}
