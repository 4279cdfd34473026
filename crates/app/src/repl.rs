use std::fmt::Write as _;

use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::app::{Surface, Tab, TutorApp};
use crate::auth::{LoginForm, RegistrationForm};
use crate::chat::{Author, ChatSurface, ConversationId, Segment, render_message};
use crate::ids::{AttachmentId, NoteId};
use crate::panels::Panel;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CommandError {
    #[snafu(display("unknown command `/{name}`, try /help"))]
    UnknownCommand { stage: &'static str, name: String },
    #[snafu(display("`/{command}` needs {expected}"))]
    MissingArgument {
        stage: &'static str,
        command: &'static str,
        expected: &'static str,
    },
    #[snafu(display("`{value}` is not a {expected}"))]
    InvalidArgument {
        stage: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReplError {
    #[snafu(display("failed to read terminal input on `{stage}`: {source}"))]
    ReadInput {
        stage: &'static str,
        source: std::io::Error,
    },
    #[snafu(display("failed to write terminal output on `{stage}`: {source}"))]
    WriteOutput {
        stage: &'static str,
        source: std::io::Error,
    },
}

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    ShowLogin,
    Back,
    Login(LoginForm),
    Register(RegistrationForm),
    Logout,
    Tab(Tab),
    Files,
    List(String),
    New,
    Select(ConversationId),
    Delete(ConversationId),
    Say(String),
    NewAdventure,
    ContinueAdventure,
    Faq(String),
    TogglePanel(Panel),
    OpenPanel(Panel),
    ClosePanel(Panel),
    Search(String),
    Attach(AttachmentId),
    Detach(AttachmentId),
    CreateKnowledgeBase { name: String, description: String },
    Upload(Vec<String>),
    Note { title: String, content: String },
    DeleteNote(NoteId),
    Usage,
}

impl Command {
    /// Lines starting with `/` are commands; anything else is chat text.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_string()));
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        let words = args.split_whitespace().collect::<Vec<_>>();

        let command = match name {
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "start" => Self::ShowLogin,
            "back" => Self::Back,
            "login" => {
                ensure!(
                    words.len() >= 2,
                    MissingArgumentSnafu {
                        stage: "parse-login",
                        command: "login",
                        expected: "<email> <password> [remember]",
                    }
                );
                Self::Login(LoginForm::new(
                    words[0],
                    words[1],
                    words.get(2) == Some(&"remember"),
                ))
            }
            "register" => {
                ensure!(
                    words.len() >= 4,
                    MissingArgumentSnafu {
                        stage: "parse-register",
                        command: "register",
                        expected: "<name> <email> <password> <confirm> [agree]",
                    }
                );
                Self::Register(RegistrationForm {
                    name: words[0].to_string(),
                    email: words[1].to_string(),
                    password: words[2].to_string(),
                    confirm_password: words[3].to_string(),
                    agree_to_terms: words.get(4) == Some(&"agree"),
                })
            }
            "logout" => Self::Logout,
            "tab" => Self::Tab(parse_tab(args)?),
            "files" => Self::Files,
            "list" => Self::List(args.to_string()),
            "new" => Self::New,
            "select" => Self::Select(ConversationId::from(required(args, "select", "<conversation id>")?)),
            "delete" => Self::Delete(ConversationId::from(required(args, "delete", "<conversation id>")?)),
            "adventure" => match args {
                "" | "new" => Self::NewAdventure,
                "continue" => Self::ContinueAdventure,
                other => {
                    return InvalidArgumentSnafu {
                        stage: "parse-adventure",
                        value: other.to_string(),
                        expected: "`new` or `continue`",
                    }
                    .fail();
                }
            },
            "faq" => Self::Faq(required(args, "faq", "<faq id>")?.to_string()),
            "panel" => Self::TogglePanel(parse_panel(args)?),
            "open" => Self::OpenPanel(parse_panel(args)?),
            "close" => Self::ClosePanel(parse_panel(args)?),
            "search" => Self::Search(args.to_string()),
            "attach" => Self::Attach(AttachmentId::from(required(args, "attach", "<item id>")?)),
            "detach" => Self::Detach(AttachmentId::from(required(args, "detach", "<item id>")?)),
            "kb" => {
                let (name, description) = args.split_once('|').unwrap_or((args, ""));
                Self::CreateKnowledgeBase {
                    name: name.trim().to_string(),
                    description: description.trim().to_string(),
                }
            }
            "upload" => {
                ensure!(
                    !words.is_empty(),
                    MissingArgumentSnafu {
                        stage: "parse-upload",
                        command: "upload",
                        expected: "one or more file names",
                    }
                );
                Self::Upload(words.iter().map(|word| word.to_string()).collect())
            }
            "note" => {
                let (title, content) = args.split_once('|').unwrap_or((args, ""));
                Self::Note {
                    title: title.trim().to_string(),
                    content: content.trim().to_string(),
                }
            }
            "unnote" => Self::DeleteNote(NoteId::from(required(args, "unnote", "<note id>")?)),
            "usage" => Self::Usage,
            other => {
                return UnknownCommandSnafu {
                    stage: "parse-command",
                    name: other.to_string(),
                }
                .fail();
            }
        };

        Ok(command)
    }
}

fn required<'a>(
    args: &'a str,
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    Some(args)
        .filter(|args| !args.is_empty())
        .context(MissingArgumentSnafu {
            stage: "parse-required-argument",
            command,
            expected,
        })
}

fn parse_tab(value: &str) -> Result<Tab, CommandError> {
    match value {
        "chat" => Ok(Tab::Chat),
        "files" => Ok(Tab::Files),
        "discover" => Ok(Tab::Discover),
        other => InvalidArgumentSnafu {
            stage: "parse-tab",
            value: other.to_string(),
            expected: "tab (chat, files, discover)",
        }
        .fail(),
    }
}

fn parse_panel(value: &str) -> Result<Panel, CommandError> {
    match value {
        "notes" => Ok(Panel::Notes),
        "docs" | "documents" => Ok(Panel::DocumentsDropdown),
        "kb" => Ok(Panel::KnowledgeBaseModal),
        other => InvalidArgumentSnafu {
            stage: "parse-panel",
            value: other.to_string(),
            expected: "panel (notes, docs, kb)",
        }
        .fail(),
    }
}

/// Command behind a rendered "Knowledge Base" link. Opening is idempotent, so
/// following the link never closes an overlay that is already up.
pub const KNOWLEDGE_BASE_LINK: &str = "/open kb";

pub const HELP: &str = "\
/start                      open the sign-in form
/back                       leave the sign-in form
/login <email> <pw> [remember]
/register <name> <email> <pw> <confirm> [agree]
/logout
/tab chat|files|discover    /files
/list [filter]  /new  /select <id>  /delete <id>
/adventure [new|continue]   /faq <id>
/panel notes|docs|kb        /open <panel>  /close <panel>
/search [query]  /attach <id>  /detach <id>  /kb <name> | <description>
/upload <file>...
/note <title> | <content>   /unnote <id>
/usage  /help  /quit
anything else is sent as a chat message";

/// Applies one command. Returns false when the loop should stop.
pub async fn dispatch(app: &mut TutorApp, command: Command, out: &mut String) -> bool {
    match command {
        Command::Help => out.push_str(HELP),
        Command::Quit => return false,
        Command::ShowLogin => {
            app.show_login();
            let prefill = app.login_prefill();
            if !prefill.email.is_empty() {
                let _ = write!(out, "remembered: {}", prefill.email);
            }
        }
        Command::Back => app.back(),
        Command::Login(form) => {
            app.submit_login(form).await;
        }
        Command::Register(form) => {
            app.submit_registration(form).await;
        }
        Command::Logout => app.logout(),
        Command::Tab(tab) => app.select_tab(tab),
        Command::Files => app.navigate_to_files(),
        Command::List(filter) => {
            for conversation in app.conversations(&filter) {
                let marker = if app.active_conversation() == Some(&conversation.id) {
                    "*"
                } else {
                    " "
                };
                let _ = writeln!(
                    out,
                    "{marker} [{}] {} ({} messages) - {}",
                    conversation.id,
                    conversation.title,
                    conversation.message_count,
                    conversation.last_message_preview
                );
            }
        }
        Command::New => {
            let id = app.new_conversation();
            let _ = write!(out, "new conversation {id}");
        }
        Command::Select(id) => app.select_conversation(id),
        Command::Delete(id) => app.delete_conversation(&id),
        Command::Say(text) => {
            app.send_text(text);
        }
        Command::NewAdventure => {
            app.start_new_adventure();
        }
        Command::ContinueAdventure => {
            app.continue_adventure();
        }
        Command::Faq(id) => {
            app.select_faq(&id);
        }
        Command::TogglePanel(panel) => {
            let open = app.toggle_panel(panel);
            let _ = write!(out, "{panel:?} {}", if open { "open" } else { "closed" });
        }
        Command::OpenPanel(panel) => {
            app.open_panel(panel);
            let _ = write!(out, "{panel:?} open");
        }
        Command::ClosePanel(panel) => {
            app.close_panel(panel);
            let _ = write!(out, "{panel:?} closed");
        }
        Command::Search(query) => {
            for item in app.search_catalog(&query) {
                let _ = writeln!(out, "[{}] {} ({})", item.id, item.display_name, item.kind.label());
            }
        }
        Command::Attach(id) => {
            app.attach(&id);
        }
        Command::Detach(id) => {
            app.detach(&id);
        }
        Command::CreateKnowledgeBase { name, description } => {
            app.create_knowledge_base(&name, &description);
        }
        Command::Upload(files) => {
            app.upload_files(files);
        }
        Command::Note { title, content } => {
            if let Some(id) = app.create_note(&title, &content) {
                let _ = write!(out, "note {id} saved");
            }
        }
        Command::DeleteNote(id) => {
            app.delete_note(&id);
        }
        Command::Usage => {
            let usage = app.usage();
            let _ = write!(
                out,
                "{} of {} tokens left today. {}",
                usage.remaining(),
                usage.daily_limit(),
                usage.mood().status_line()
            );
        }
    }
    true
}

/// Renders the current surface plus any queued notices.
pub fn render(app: &mut TutorApp) -> String {
    let mut out = String::new();

    match app.surface() {
        Surface::Welcome => {
            out.push_str("Welcome to Trạng Nhí AI. Type /start to sign in.\n");
        }
        Surface::Login => {
            out.push_str("Sign in with /login or create an account with /register.\n");
        }
        Surface::Main { tab, chat } => {
            let name = app
                .session()
                .map(|session| session.display_name.clone())
                .unwrap_or_default();
            let _ = writeln!(out, "== {name} | {tab:?} ==");
            match (tab, chat) {
                (Tab::Chat, ChatSurface::Welcome) => render_welcome(app, &mut out),
                (Tab::Chat, ChatSurface::Transcript(id)) => render_transcript(app, &id, &mut out),
                (Tab::Files, _) => render_files(app, &mut out),
                (Tab::Discover, _) => out.push_str("Discover is coming soon.\n"),
            }
        }
    }

    for notice in app.drain_notices() {
        let _ = writeln!(
            out,
            "({}) {}: {}",
            notice.level.label(),
            notice.title,
            notice.message
        );
    }
    out
}

fn render_welcome(app: &TutorApp, out: &mut String) {
    out.push_str("Start with /adventure new, /adventure continue, or pick a question:\n");
    for faq in app.faqs() {
        let _ = writeln!(out, "  /faq {}  {}", faq.id, faq.question);
    }
}

fn render_transcript(app: &TutorApp, id: &ConversationId, out: &mut String) {
    for message in app.messages(id) {
        let who = match message.author {
            Author::User => "you",
            Author::Assistant => "tutor",
        };
        let body = render_message(message)
            .into_iter()
            .map(|segment| match segment {
                Segment::Text(text) => text,
                Segment::KnowledgeBaseLink(text) => format!("[{text}]({KNOWLEDGE_BASE_LINK})"),
            })
            .collect::<String>();
        let _ = writeln!(out, "{who}> {body}");
    }
    if app.is_typing() {
        out.push_str("tutor is typing...\n");
    }
}

fn render_files(app: &TutorApp, out: &mut String) {
    out.push_str("Attached here:\n");
    for item in app.attachments() {
        let _ = writeln!(out, "  [{}] {}", item.id, item.display_name);
    }
    out.push_str("Catalog:\n");
    for item in app.search_catalog("") {
        let _ = writeln!(out, "  [{}] {} ({})", item.id, item.display_name, item.kind.label());
    }
}

/// Runs the terminal loop until stdin closes or `/quit`.
pub async fn run(app: &mut TutorApp) -> Result<(), ReplError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    write_out(&mut stdout, &render(app)).await?;

    loop {
        let mut out = String::new();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context(ReadInputSnafu { stage: "repl-read-line" })? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(command) => {
                        if !dispatch(app, command, &mut out).await {
                            break;
                        }
                    }
                    Err(error) => {
                        let _ = write!(out, "{error}");
                    }
                }
            }
            Some(event) = app.next_reply_event(), if app.has_pending_replies() => {
                app.apply_reply_event(event);
            }
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&render(app));
        write_out(&mut stdout, &out).await?;
    }

    Ok(())
}

async fn write_out(stdout: &mut tokio::io::Stdout, text: &str) -> Result<(), ReplError> {
    stdout
        .write_all(text.as_bytes())
        .await
        .context(WriteOutputSnafu {
            stage: "repl-write",
        })?;
    stdout.flush().await.context(WriteOutputSnafu {
        stage: "repl-flush",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(
            Command::parse("  hello there ").unwrap(),
            Command::Say("hello there".to_string())
        );
    }

    #[test]
    fn login_parses_remember_flag() {
        assert_eq!(
            Command::parse("/login a@b.com secret remember").unwrap(),
            Command::Login(LoginForm::new("a@b.com", "secret", true))
        );
        assert!(matches!(
            Command::parse("/login a@b.com"),
            Err(CommandError::MissingArgument { command: "login", .. })
        ));
    }

    #[test]
    fn piped_arguments_split_name_and_description() {
        assert_eq!(
            Command::parse("/kb Chemistry | organic notes").unwrap(),
            Command::CreateKnowledgeBase {
                name: "Chemistry".to_string(),
                description: "organic notes".to_string(),
            }
        );
    }

    #[test]
    fn unknown_and_invalid_commands_are_reported() {
        assert!(matches!(
            Command::parse("/dance"),
            Err(CommandError::UnknownCommand { .. })
        ));
        assert!(matches!(
            Command::parse("/panel sidebar"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Command::parse("/select"),
            Err(CommandError::MissingArgument { command: "select", .. })
        ));
    }

    fn app() -> TutorApp {
        TutorApp::new(
            std::sync::Arc::new(crate::settings::AppSettings::default()),
            std::sync::Arc::new(tnai_storage::MemoryStorage::new()),
        )
    }

    #[tokio::test]
    async fn knowledge_base_link_keeps_an_open_overlay_open() {
        let mut app = app();
        app.open_panel(Panel::KnowledgeBaseModal);

        let command = Command::parse(KNOWLEDGE_BASE_LINK).unwrap();
        assert_eq!(command, Command::OpenPanel(Panel::KnowledgeBaseModal));

        let mut out = String::new();
        assert!(dispatch(&mut app, command.clone(), &mut out).await);
        assert!(app.panels().is_open(Panel::KnowledgeBaseModal));

        assert!(dispatch(&mut app, command, &mut out).await);
        assert!(app.panels().is_open(Panel::KnowledgeBaseModal));
    }

    #[tokio::test]
    async fn knowledge_base_link_opens_a_closed_overlay() {
        let mut app = app();
        assert!(!app.panels().is_open(Panel::KnowledgeBaseModal));

        let mut out = String::new();
        dispatch(&mut app, Command::parse(KNOWLEDGE_BASE_LINK).unwrap(), &mut out).await;

        assert!(app.panels().is_open(Panel::KnowledgeBaseModal));
        assert!(app.panels().notes_panel_open());
        assert_eq!(out, "KnowledgeBaseModal open");

        out.clear();
        dispatch(&mut app, Command::parse("/close kb").unwrap(), &mut out).await;
        assert!(!app.panels().is_open(Panel::KnowledgeBaseModal));
        assert_eq!(out, "KnowledgeBaseModal closed");
    }

    #[test]
    fn upload_collects_every_name() {
        assert_eq!(
            Command::parse("/upload a.pdf b.exe").unwrap(),
            Command::Upload(vec!["a.pdf".to_string(), "b.exe".to_string()])
        );
    }
}
