//! Request builder: farm action to device route and body
//!
//! Pure mapping, no I/O. Every action in the catalog yields a plan.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::action::Action;

/// Heater channel addressed by a preheat request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Tool,
    Bed,
}

impl Channel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Bed => "bed",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control route on a printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Job,
    Files,
    File(String),
    Printer(Channel),
    Shutdown,
}

impl Route {
    /// Path of this route relative to the printer's base URL
    ///
    /// File names are percent-encoded as a single path segment.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Job => "/api/job".to_string(),
            Self::Files => "/api/files/local".to_string(),
            Self::File(name) => format!("/api/files/local/{}", urlencoding::encode(name)),
            Self::Printer(channel) => format!("/api/printer/{channel}"),
            Self::Shutdown => "/api/system/commands/core/shutdown".to_string(),
        }
    }
}

/// One POST to a printer
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub route: Route,
    /// JSON body; `None` posts an empty body
    pub body: Option<Value>,
}

impl Request {
    fn json(route: Route, body: Value) -> Self {
        Self {
            route,
            body: Some(body),
        }
    }
}

/// Device exchanges needed to carry out one action on one printer
#[derive(Debug, Clone)]
pub enum RequestPlan {
    /// Handled locally, no device traffic
    Local,
    Single(Request),
    /// Multipart upload to the files route, then select-and-print on the
    /// uploaded file's own route
    UploadThenSelect {
        file_name: String,
        content: Arc<[u8]>,
    },
    /// Two independent requests for the tool and bed heaters
    Dual { tool: Request, bed: Request },
}

/// Build the request plan for an action
#[must_use]
pub fn build(action: &Action) -> RequestPlan {
    match action {
        Action::Print => RequestPlan::Single(Request::json(Route::Job, json!({"command": "start"}))),
        Action::Pause => RequestPlan::Single(Request::json(
            Route::Job,
            json!({"command": "pause", "action": "pause"}),
        )),
        Action::Resume => RequestPlan::Single(Request::json(
            Route::Job,
            json!({"command": "pause", "action": "resume"}),
        )),
        Action::Cancel => {
            RequestPlan::Single(Request::json(Route::Job, json!({"command": "cancel"})))
        }
        Action::Load(upload) => RequestPlan::UploadThenSelect {
            file_name: upload.file_name.clone(),
            content: Arc::clone(&upload.content),
        },
        Action::LoadFile { file_name } => RequestPlan::Single(Request::json(
            Route::File(file_name.clone()),
            select_body(),
        )),
        Action::Preheat { tool, bed } => RequestPlan::Dual {
            tool: Request::json(
                Route::Printer(Channel::Tool),
                json!({"command": "target", "targets": {"tool0": tool}}),
            ),
            bed: Request::json(
                Route::Printer(Channel::Bed),
                json!({"command": "target", "target": bed}),
            ),
        },
        Action::Shutdown => RequestPlan::Single(Request {
            route: Route::Shutdown,
            body: None,
        }),
        Action::Finish => RequestPlan::Local,
    }
}

/// Body that selects a stored file and starts printing it
#[must_use]
pub fn select_body() -> Value {
    json!({"command": "select", "print": true})
}

/// Remote name for an uploaded file, tagged with a correlation token
///
/// The token goes after the first dot-separated segment:
/// `benchy.gcode` becomes `benchy-<token>.gcode`.
#[must_use]
pub fn remote_file_name(file_name: &str, token: &str) -> String {
    match file_name.split_once('.') {
        Some((stem, rest)) => format!("{stem}-{token}.{rest}"),
        None => format!("{file_name}-{token}"),
    }
}

/// Fresh correlation token for one upload
#[must_use]
pub fn correlation_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::action::Upload;

    fn single(action: &Action) -> Request {
        match build(action) {
            RequestPlan::Single(request) => request,
            other => panic!("expected single request, got {other:?}"),
        }
    }

    #[test]
    fn job_commands_share_the_job_route() {
        for action in [Action::Print, Action::Pause, Action::Resume, Action::Cancel] {
            assert_eq!(single(&action).route, Route::Job);
        }
    }

    #[test]
    fn pause_and_resume_differ_by_action_field() {
        assert_eq!(
            single(&Action::Pause).body,
            Some(json!({"command": "pause", "action": "pause"}))
        );
        assert_eq!(
            single(&Action::Resume).body,
            Some(json!({"command": "pause", "action": "resume"}))
        );
    }

    #[test]
    fn print_and_cancel_bodies() {
        assert_eq!(single(&Action::Print).body, Some(json!({"command": "start"})));
        assert_eq!(single(&Action::Cancel).body, Some(json!({"command": "cancel"})));
    }

    #[test]
    fn load_file_selects_and_prints() {
        let request = single(&Action::LoadFile {
            file_name: "benchy.gcode".to_string(),
        });
        assert_eq!(request.route.path(), "/api/files/local/benchy.gcode");
        assert_eq!(request.body, Some(json!({"command": "select", "print": true})));
    }

    #[test]
    fn preheat_builds_two_channel_requests() {
        let RequestPlan::Dual { tool, bed } = build(&Action::Preheat { tool: 200, bed: 60 }) else {
            panic!("expected dual plan");
        };
        assert_eq!(tool.route.path(), "/api/printer/tool");
        assert_eq!(
            tool.body,
            Some(json!({"command": "target", "targets": {"tool0": 200}}))
        );
        assert_eq!(bed.route.path(), "/api/printer/bed");
        assert_eq!(bed.body, Some(json!({"command": "target", "target": 60})));
    }

    #[test]
    fn shutdown_has_no_body() {
        let request = single(&Action::Shutdown);
        assert_eq!(request.route.path(), "/api/system/commands/core/shutdown");
        assert!(request.body.is_none());
    }

    #[test]
    fn load_carries_content_and_finish_is_local() {
        let upload = Upload {
            file_name: "cube.gcode".to_string(),
            content: Arc::from(b"G28".as_slice()),
        };
        let RequestPlan::UploadThenSelect { file_name, content } = build(&Action::Load(upload))
        else {
            panic!("expected upload plan");
        };
        assert_eq!(file_name, "cube.gcode");
        assert_eq!(&*content, b"G28");
        assert!(matches!(build(&Action::Finish), RequestPlan::Local));
    }

    #[test]
    fn remote_name_inserts_token_after_stem() {
        assert_eq!(remote_file_name("benchy.gcode", "abcd1234"), "benchy-abcd1234.gcode");
        assert_eq!(remote_file_name("part.v2.gco", "t"), "part-t.v2.gco");
        assert_eq!(remote_file_name("noext", "t"), "noext-t");
    }

    #[test]
    fn file_route_encodes_reserved_characters() {
        assert_eq!(
            Route::File("part#2.gcode".to_string()).path(),
            "/api/files/local/part%232.gcode"
        );
        assert_eq!(
            Route::File("what?.gcode".to_string()).path(),
            "/api/files/local/what%3F.gcode"
        );
        assert_eq!(
            Route::File("a/b.gcode".to_string()).path(),
            "/api/files/local/a%2Fb.gcode"
        );
    }

    #[test]
    fn correlation_tokens_are_fresh() {
        let a = correlation_token();
        let b = correlation_token();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }
}
