//! Decides what a verified webhook delivery turns into.
//!
//! Every (event, action) pair that leads to work is listed in
//! [`Dispatcher::decide`]; anything not listed is rejected.

use std::fmt;

use crate::{
    event::{
        IssueCommentAction, IssueCommentEvent, PullRequestAction, PullRequestEvent, WebhookEvent,
    },
    jobs::{ActionTag, DispatchJob},
};

pub const DEFAULT_TRIGGER: &str = "@mergemuppet";

const SUMMARY_INSTRUCTION: &str = "Update the description with a summary of the PR changes.";
const WALKTHROUGH_INSTRUCTION: &str = "Create a new PR comment with a walkthrough of the changes.";

/// Why an authentic delivery produced no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnsupportedEvent,
    UnsupportedAction,
    /// Authored by a bot; reacting could trigger ourselves in a loop.
    AutomatedSender,
    MissingTrigger,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnsupportedEvent => "unsupported event",
            Self::UnsupportedAction => "unsupported action",
            Self::AutomatedSender => "sender is a bot",
            Self::MissingTrigger => "comment does not mention the trigger",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer a `ping` with its zen line.
    Pong(String),
    /// Schedule these jobs and acknowledge.
    Dispatch(Vec<DispatchJob>),
    NotActionable(Rejection),
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    trigger: String,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER)
    }
}

impl Dispatcher {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self { trigger: trigger.into() }
    }

    pub fn decide(&self, event: WebhookEvent) -> Decision {
        use Decision::{Dispatch, NotActionable, Pong};
        use Rejection::*;

        match event {
            WebhookEvent::Ping(ping) => Pong(ping.zen),

            WebhookEvent::PullRequest(pr) => match (&pr.action, pr.sender.kind.is_automated()) {
                (PullRequestAction::Opened, true) => NotActionable(AutomatedSender),
                (PullRequestAction::Opened, false) => Dispatch(review_jobs(&pr)),
                _ => NotActionable(UnsupportedAction),
            },

            WebhookEvent::IssueComment(comment) => match (
                &comment.action,
                comment.sender.kind.is_automated(),
                comment.comment.body.contains(&self.trigger),
            ) {
                (IssueCommentAction::Created, true, _) => NotActionable(AutomatedSender),
                (IssueCommentAction::Created, false, false) => NotActionable(MissingTrigger),
                (IssueCommentAction::Created, false, true) => Dispatch(vec![comment_job(&comment)]),
                _ => NotActionable(UnsupportedAction),
            },

            WebhookEvent::Other { .. } => NotActionable(UnsupportedEvent),
        }
    }
}

fn review_jobs(pr: &PullRequestEvent) -> Vec<DispatchJob> {
    [
        (SUMMARY_INSTRUCTION, ActionTag::Summary),
        (WALKTHROUGH_INSTRUCTION, ActionTag::Walkthrough),
    ]
    .into_iter()
    .map(|(instruction, tag)| DispatchJob {
        instruction: instruction.to_string(),
        number: pr.number,
        repository: pr.repository.name.clone(),
        tag,
    })
    .collect()
}

fn comment_job(event: &IssueCommentEvent) -> DispatchJob {
    DispatchJob {
        instruction: event.comment.body.clone(),
        number: event.issue.number,
        repository: event.repository.name.clone(),
        tag: ActionTag::Unspecified,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pull_request(action: &str, sender_type: &str) -> WebhookEvent {
        let body = json!({
            "action": action,
            "number": 12,
            "pull_request": {"title": "Speed up parser", "body": "Closes #3"},
            "repository": {"name": "mergebot"},
            "sender": {"login": "octocat", "type": sender_type}
        });
        WebhookEvent::parse("pull_request", &serde_json::to_vec(&body).unwrap()).unwrap()
    }

    fn issue_comment(action: &str, text: &str, sender_type: &str) -> WebhookEvent {
        let body = json!({
            "action": action,
            "comment": {"body": text},
            "issue": {"number": 5},
            "repository": {"name": "mergebot"},
            "sender": {"login": "octocat", "type": sender_type}
        });
        WebhookEvent::parse("issue_comment", &serde_json::to_vec(&body).unwrap()).unwrap()
    }

    #[test]
    fn ping_answers_with_zen() {
        let event = WebhookEvent::parse("ping", br#"{"zen": "Speak like a human."}"#).unwrap();

        assert_eq!(
            Dispatcher::default().decide(event),
            Decision::Pong("Speak like a human.".to_string())
        );
    }

    #[test]
    fn opened_pull_request_schedules_summary_and_walkthrough() {
        let Decision::Dispatch(jobs) = Dispatcher::default().decide(pull_request("opened", "User"))
        else {
            panic!("expected dispatch");
        };

        let tags: Vec<ActionTag> = jobs.iter().map(|j| j.tag).collect();
        assert_eq!(tags, vec![ActionTag::Summary, ActionTag::Walkthrough]);
        assert!(jobs.iter().all(|j| j.number == 12 && j.repository == "mergebot"));
        assert_eq!(jobs[0].instruction, SUMMARY_INSTRUCTION);
        assert_eq!(jobs[1].instruction, WALKTHROUGH_INSTRUCTION);
    }

    #[test]
    fn other_pull_request_actions_are_rejected() {
        for action in ["closed", "edited", "reopened", "synchronize", "labeled"] {
            assert_eq!(
                Dispatcher::default().decide(pull_request(action, "User")),
                Decision::NotActionable(Rejection::UnsupportedAction),
                "{action}"
            );
        }
    }

    #[test]
    fn bot_pull_request_is_rejected() {
        assert_eq!(
            Dispatcher::default().decide(pull_request("opened", "Bot")),
            Decision::NotActionable(Rejection::AutomatedSender)
        );
    }

    #[test]
    fn triggered_comment_schedules_one_job() {
        let text = "@mergemuppet can you explain the lexer change?";

        let decision = Dispatcher::default().decide(issue_comment("created", text, "User"));

        assert_eq!(
            decision,
            Decision::Dispatch(vec![DispatchJob {
                instruction: text.to_string(),
                number: 5,
                repository: "mergebot".to_string(),
                tag: ActionTag::Unspecified,
            }])
        );
    }

    #[test]
    fn comment_rejections() {
        let dispatcher = Dispatcher::default();

        assert_eq!(
            dispatcher.decide(issue_comment("created", "@mergemuppet review", "Bot")),
            Decision::NotActionable(Rejection::AutomatedSender)
        );
        assert_eq!(
            dispatcher.decide(issue_comment("created", "looks good to me", "User")),
            Decision::NotActionable(Rejection::MissingTrigger)
        );
        assert_eq!(
            dispatcher.decide(issue_comment("edited", "@mergemuppet review", "User")),
            Decision::NotActionable(Rejection::UnsupportedAction)
        );
        assert_eq!(
            dispatcher.decide(issue_comment("deleted", "@mergemuppet review", "User")),
            Decision::NotActionable(Rejection::UnsupportedAction)
        );
    }

    #[test]
    fn custom_trigger() {
        let dispatcher = Dispatcher::new("/agent");

        assert!(matches!(
            dispatcher.decide(issue_comment("created", "/agent summarize", "User")),
            Decision::Dispatch(_)
        ));
        assert_eq!(
            dispatcher.decide(issue_comment("created", "@mergemuppet summarize", "User")),
            Decision::NotActionable(Rejection::MissingTrigger)
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        let event = WebhookEvent::parse("push", br#"{"ref": "refs/heads/main"}"#).unwrap();

        assert_eq!(
            Dispatcher::default().decide(event),
            Decision::NotActionable(Rejection::UnsupportedEvent)
        );
    }
}
