// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the catalog screens.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the front end presents it.

use crate::error::CoastersError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or timeout; trying again may help.
    Transient,
    /// The user has to change something (settings, the slug they asked for).
    ActionRequired,
    /// A bug in the caller or the app; retrying will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same request may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `CoastersError` into a `HumanError` the list and detail screens can show.
pub fn humanize_error(err: &CoastersError) -> HumanError {
    match err {
        CoastersError::HostUnreachable(detail) => humanize_unreachable(detail),

        CoastersError::DecodeFailure(_) => HumanError {
            message: "The catalog server sent something we couldn't read.".into(),
            suggestion: "The server may be a different version than this app. Check the server address (--base-url or the config file).".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CoastersError::Transport(detail) => HumanError {
            message: "The connection to the catalog server failed.".into(),
            suggestion: format!("Check your network connection and try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        CoastersError::NotFound(slug) => HumanError {
            message: "That coaster isn't in the catalog any more.".into(),
            suggestion: format!("Go back to the list and pick another one. (Looked for: {slug})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CoastersError::ArenaClosed | CoastersError::IndexOutOfRange { .. } => HumanError {
            message: "The app read catalog data it no longer had.".into(),
            suggestion: "This is a bug in the app; please report it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        CoastersError::Bridge(_) => HumanError {
            message: "The native catalog module didn't respond properly.".into(),
            suggestion: "Try restarting the app.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CoastersError::TaskFailed(_) => HumanError {
            message: "Loading was interrupted.".into(),
            suggestion: "Try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CoastersError::Config(detail) => HumanError {
            message: "The app settings aren't valid.".into(),
            suggestion: format!("Fix or remove the configuration file. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CoastersError::Io(_) => HumanError {
            message: "There was a problem reading or writing a file.".into(),
            suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CoastersError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

/// Pick the message for an exhausted host list from the collected attempt details.
fn humanize_unreachable(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") {
        HumanError {
            message: "The catalog server didn't respond in time.".into(),
            suggestion: "The server might be busy or your connection slow. Try again in a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("http status") {
        HumanError {
            message: "The catalog server is having trouble.".into(),
            suggestion: "It answered, but not with the catalog. Try again later.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "We couldn't reach the catalog server.".into(),
            suggestion: "Make sure the server is running and that this device is on the same network.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
