//! Typed projections of the GitHub webhook payloads we act on.
//!
//! Only the fields the dispatcher reads are modelled; everything else in
//! the body is ignored by serde.

use serde::Deserialize;

pub const PING: &str = "ping";
pub const PULL_REQUEST: &str = "pull_request";
pub const ISSUE_COMMENT: &str = "issue_comment";

/// Who authored the event, as reported in `sender.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SenderKind {
    User,
    Bot,
    Organization,
    #[serde(other)]
    Unknown,
}

impl SenderKind {
    pub fn is_automated(self) -> bool {
        self == SenderKind::Bot
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    /// e.g. `octocat` or `my-app[bot]`
    pub login: String,
    #[serde(rename = "type")]
    pub kind: SenderKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub title: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    /// Issue or pull request number; GitHub shares the sequence.
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PullRequestAction {
    Opened,
    Closed,
    Reopened,
    Edited,
    Synchronize,
    Other(String),
}

impl From<String> for PullRequestAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "opened" => Self::Opened,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            "edited" => Self::Edited,
            "synchronize" => Self::Synchronize,
            _ => Self::Other(action),
        }
    }
}

impl PullRequestAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::Edited => "edited",
            Self::Synchronize => "synchronize",
            Self::Other(action) => action,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum IssueCommentAction {
    #[default]
    Created,
    Edited,
    Deleted,
    Other(String),
}

impl From<String> for IssueCommentAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "created" => Self::Created,
            "edited" => Self::Edited,
            "deleted" => Self::Deleted,
            _ => Self::Other(action),
        }
    }
}

impl IssueCommentAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Edited => "edited",
            Self::Deleted => "deleted",
            Self::Other(action) => action,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PingEvent {
    pub zen: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub number: u64,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: Sender,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    /// GitHub always sends it; absent means `created`.
    #[serde(default)]
    pub action: IssueCommentAction,
    pub comment: Comment,
    pub issue: Issue,
    pub repository: Repository,
    pub sender: Sender,
}

/// A webhook delivery after authentication, keyed by `X-GitHub-Event`.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Ping(PingEvent),
    PullRequest(PullRequestEvent),
    IssueComment(IssueCommentEvent),
    /// A kind we don't handle. The body was still valid JSON.
    Other { kind: String, action: Option<String> },
}

impl WebhookEvent {
    /// Parses `body` according to the declared event `kind`.
    ///
    /// Fails on malformed JSON and on bodies missing fields required for
    /// the declared kind. Unknown kinds only need to be valid JSON; their
    /// `action` is kept when it is a string.
    pub fn parse(kind: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        let event = match kind {
            PING => Self::Ping(serde_json::from_slice(body)?),
            PULL_REQUEST => Self::PullRequest(serde_json::from_slice(body)?),
            ISSUE_COMMENT => Self::IssueComment(serde_json::from_slice(body)?),
            _ => {
                let untyped: serde_json::Value = serde_json::from_slice(body)?;
                let action = untyped.get("action").and_then(|a| a.as_str()).map(str::to_owned);
                Self::Other { kind: kind.to_string(), action }
            }
        };
        Ok(event)
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Ping(_) => PING,
            Self::PullRequest(_) => PULL_REQUEST,
            Self::IssueComment(_) => ISSUE_COMMENT,
            Self::Other { kind, .. } => kind,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Ping(_) => None,
            Self::PullRequest(event) => Some(event.action.as_str()),
            Self::IssueComment(event) => Some(event.action.as_str()),
            Self::Other { action, .. } => action.as_deref(),
        }
    }
}
