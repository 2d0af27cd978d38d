use super::Output;
use super::ReplCommand;
use super::ReplState;
use crate::domain::models::Action;
use crate::domain::models::AttachmentFile;
use crate::domain::models::ChatSummary;
use crate::domain::models::EngineError;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Project;
use crate::domain::models::Role;
use crate::domain::models::SavedPrompt;
use crate::domain::models::TurnOutcome;
use crate::domain::models::TurnState;

fn auto_state() -> ReplState {
    return ReplState::new("auto", "small", "large");
}

fn summary(id: &str, title: &str) -> ChatSummary {
    return ChatSummary {
        id: id.to_string(),
        title: title.to_string(),
        updated_at: 0,
    };
}

fn notice(text: &str) -> ReplCommand {
    return ReplCommand::Show(Output::Notice(text.to_string()));
}

#[test]
fn it_sends_plain_lines_with_the_suggested_model() {
    let mut state = auto_state();

    assert_eq!(
        state.handle_line("What is the capital of France?"),
        vec![
            notice("[small, picked for a simple request]"),
            ReplCommand::Dispatch(Action::Send(
                "What is the capital of France?".to_string(),
                vec![],
                Some("small".to_string())
            )),
        ]
    );

    let res = state.handle_line("Explain the algorithm step by step");
    assert_eq!(res[0], notice("[large, picked for a complex request]"));
}

#[test]
fn it_uses_a_fixed_model_when_one_is_picked() {
    let mut state = auto_state();
    assert_eq!(
        state.handle_line("/model gpt-4o"),
        vec![notice("Using gpt-4o.")]
    );

    let res = state.handle_line("hello");
    assert_eq!(res[0], notice("[gpt-4o]"));
    assert_eq!(
        res[1],
        ReplCommand::Dispatch(Action::Send(
            "hello".to_string(),
            vec![],
            Some("gpt-4o".to_string())
        ))
    );
}

#[test]
fn it_ignores_blank_lines() {
    let mut state = auto_state();
    assert!(state.handle_line("   ").is_empty());
}

#[test]
fn it_sends_pending_attachments_once() {
    let mut state = auto_state();
    assert_eq!(
        state.handle_line("/attach notes/a file.txt"),
        vec![ReplCommand::Attach("notes/a file.txt".to_string())]
    );

    let file = AttachmentFile::new("a file.txt", "text/plain", b"hello".to_vec());
    state.attach(file.clone());
    assert_eq!(state.pending().len(), 1);

    let res = state.handle_line("");
    assert_eq!(res[0], notice("[large, picked for a complex request]"));
    assert_eq!(
        res[1],
        ReplCommand::Dispatch(Action::Send("".to_string(), vec![file], Some("large".to_string())))
    );
    assert!(state.pending().is_empty());
}

#[test]
fn it_detaches_pending_files() {
    let mut state = auto_state();
    state.attach(AttachmentFile::new("a.txt", "text/plain", vec![]));
    state.attach(AttachmentFile::new("b.txt", "text/plain", vec![]));

    assert_eq!(
        state.handle_line("/detach"),
        vec![notice("Removed 2 pending attachment(s).")]
    );
    assert!(state.pending().is_empty());
}

#[test]
fn it_maps_listed_chats_to_ids() {
    let mut state = auto_state();
    assert_eq!(
        state.handle_line("/chats"),
        vec![ReplCommand::Dispatch(Action::ListChats())]
    );

    let res = state.apply_event(Event::Chats(
        vec![summary("c2", "Second"), summary("c1", "First")],
        Some("c1".to_string()),
    ));
    assert_eq!(
        res,
        vec![Output::Line("  1. Second\n* 2. First".to_string())]
    );

    assert_eq!(
        state.handle_line("/chat 1"),
        vec![ReplCommand::Dispatch(Action::SwitchChat("c2".to_string()))]
    );
    assert_eq!(
        state.handle_line("/chat 3"),
        vec![ReplCommand::Show(Output::Error(
            "No such chat. Run /chats to list them.".to_string()
        ))]
    );
}

#[test]
fn it_only_lists_chats_when_asked() {
    let mut state = auto_state();
    let res = state.apply_event(Event::Chats(vec![summary("c1", "First")], None));
    assert!(res.is_empty());
}

#[test]
fn it_prints_the_transcript_when_a_chat_opens() {
    let mut state = auto_state();
    let messages = vec![
        Message::new(Role::User, "Hi"),
        Message::new(Role::Assistant, "Hello!"),
    ];

    let res = state.apply_event(Event::Messages(Some("c1".to_string()), messages.clone()));
    assert_eq!(
        res,
        vec![Output::Line("You: Hi\n\nAssistant: Hello!".to_string())]
    );

    let res = state.apply_event(Event::Messages(Some("c1".to_string()), messages));
    assert!(res.is_empty());

    let res = state.apply_event(Event::Messages(None, vec![]));
    assert_eq!(res, vec![Output::Notice("New chat.".to_string())]);
}

#[test]
fn it_streams_fragments_during_a_turn() {
    let mut state = auto_state();
    assert!(state
        .apply_event(Event::TurnState("c1".to_string(), TurnState::Sending))
        .is_empty());
    assert!(state.in_turn());

    let res = state.apply_event(Event::Messages(
        Some("c1".to_string()),
        vec![Message::new(Role::User, "Hi")],
    ));
    assert!(res.is_empty());

    assert_eq!(
        state.apply_event(Event::Fragment("c1".to_string(), "Hel".to_string())),
        vec![Output::Fragment("Hel".to_string())]
    );
    assert_eq!(
        state.apply_event(Event::TurnFinished("c1".to_string(), TurnOutcome::Aborted)),
        vec![
            Output::Fragment("\n".to_string()),
            Output::Notice("[stopped]".to_string())
        ]
    );

    state.apply_event(Event::TurnState("c1".to_string(), TurnState::Idle));
    assert!(!state.in_turn());
}

#[test]
fn it_announces_project_switches_and_lists_their_chats() {
    let mut state = auto_state();
    let projects = vec![Project::new("General"), Project::new("Research")];

    let res = state.apply_event(Event::Projects(
        projects.clone(),
        Some(projects[1].id.to_string()),
    ));
    assert_eq!(res, vec![Output::Notice("Project: Research".to_string())]);

    let res = state.apply_event(Event::Chats(vec![], None));
    assert_eq!(
        res,
        vec![Output::Notice("No chats in this project yet.".to_string())]
    );

    assert_eq!(
        state.handle_line("/project 1"),
        vec![ReplCommand::Dispatch(Action::SwitchProject(
            projects[0].id.to_string()
        ))]
    );
    assert_eq!(
        state.handle_line("/project rename 2 Deep Research"),
        vec![ReplCommand::Dispatch(Action::RenameProject(
            projects[1].id.to_string(),
            "Deep Research".to_string()
        ))]
    );
    assert_eq!(
        state.handle_line("/project new Side work"),
        vec![ReplCommand::Dispatch(Action::CreateProject(
            "Side work".to_string()
        ))]
    );
    assert_eq!(
        state.handle_line("/project delete 1"),
        vec![ReplCommand::Dispatch(Action::DeleteProject(
            projects[0].id.to_string()
        ))]
    );
}

#[test]
fn it_uses_saved_prompts_by_index() {
    let mut state = auto_state();
    let prompt = SavedPrompt::new("review", "Review this code");

    let res = state.apply_event(Event::Prompts(vec![prompt.clone()]));
    assert_eq!(
        res,
        vec![Output::Line("  1. review: Review this code".to_string())]
    );

    let res = state.handle_line("/prompt use 1");
    assert_eq!(
        res,
        vec![
            ReplCommand::Show(Output::Line("You: Review this code".to_string())),
            notice("[large, picked for a complex request]"),
            ReplCommand::Dispatch(Action::Send(
                "Review this code".to_string(),
                vec![],
                Some("large".to_string())
            )),
        ]
    );

    assert_eq!(
        state.handle_line("/prompt save tldr Summarize in one line"),
        vec![ReplCommand::Dispatch(Action::SavePrompt(
            "tldr".to_string(),
            "Summarize in one line".to_string()
        ))]
    );
    assert_eq!(
        state.handle_line("/prompt delete 1"),
        vec![ReplCommand::Dispatch(Action::DeletePrompt(prompt.id))]
    );
}

#[test]
fn it_regenerates_with_the_model_for_the_last_question() {
    let mut state = auto_state();
    state.apply_event(Event::Messages(
        Some("c1".to_string()),
        vec![
            Message::new(Role::User, "Compare Rust and Go"),
            Message::new(Role::Assistant, "..."),
        ],
    ));

    assert_eq!(
        state.handle_line("/regen"),
        vec![
            notice("[large, picked for a complex request]"),
            ReplCommand::Dispatch(Action::Regenerate(Some("large".to_string()))),
        ]
    );
}

#[test]
fn it_needs_an_open_chat_to_rename() {
    let mut state = auto_state();
    assert_eq!(
        state.handle_line("/rename Trip plans"),
        vec![ReplCommand::Show(Output::Error(
            "There is no open chat to rename.".to_string()
        ))]
    );

    state.apply_event(Event::Messages(Some("c1".to_string()), vec![]));
    assert_eq!(
        state.handle_line("/rename Trip plans"),
        vec![ReplCommand::Dispatch(Action::RenameChat(
            "c1".to_string(),
            "Trip plans".to_string()
        ))]
    );
    assert_eq!(
        state.handle_line("/delete"),
        vec![ReplCommand::Dispatch(Action::DeleteChat("c1".to_string()))]
    );
}

#[test]
fn it_shows_errors() {
    let mut state = auto_state();
    let res = state.apply_event(Event::Error(EngineError::validation("Nothing to send")));
    assert_eq!(
        res,
        vec![Output::Error("Validation error: Nothing to send".to_string())]
    );
}

#[test]
fn it_quits() {
    let mut state = auto_state();
    assert_eq!(state.handle_line("/q"), vec![ReplCommand::Quit]);
}
