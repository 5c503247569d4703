//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::chat::command::ReplCommand;
use crate::config::ReplConfig;
use crate::output::console::ConsoleFormatter;
use crate::progress::reporter::ProgressReporter;
use chrono::Timelike;
use empathy_application::{
    AuthenticateUseCase, ChatProgress, ConversationController, NoProgress, Profile,
    SelectOutcome, SendOutcome, SendRejection,
};
use empathy_domain::{ConversationId, Credentials, Role, SignupForm, User};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Source of interactive answers during sign-in and sign-up
pub trait LinePrompt {
    /// Read one line, pre-filled with `initial`. `None` when cancelled.
    fn line(&mut self, prompt: &str, initial: &str) -> Option<String>;

    /// Read a secret without echo. `None` when cancelled.
    fn secret(&mut self, prompt: &str) -> Option<String>;
}

/// Terminal prompt backed by the REPL's line editor
pub struct TerminalPrompt {
    editor: DefaultEditor,
}

impl TerminalPrompt {
    pub fn new() -> RlResult<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LinePrompt for TerminalPrompt {
    fn line(&mut self, prompt: &str, initial: &str) -> Option<String> {
        match self.editor.readline_with_initial(prompt, (initial, "")) {
            Ok(line) => Some(line.trim().to_string()).filter(|l| !l.is_empty()),
            Err(e) => {
                debug!("Prompt cancelled: {}", e);
                None
            }
        }
    }

    fn secret(&mut self, prompt: &str) -> Option<String> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(|e| debug!("Password prompt cancelled: {}", e))
            .ok()
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    auth: AuthenticateUseCase,
    conversation: Arc<ConversationController>,
    config: ReplConfig,
    user: Option<User>,
    /// Username to pre-fill at the next sign-in prompt
    pending_username: Option<String>,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(auth: AuthenticateUseCase, conversation: Arc<ConversationController>) -> Self {
        Self {
            auth,
            conversation,
            config: ReplConfig::default(),
            user: None,
            pending_username: None,
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut prompt = TerminalPrompt::new()?;

        let history_path = self.config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = prompt.editor.load_history(path);
        }

        self.print_welcome();
        self.resume().await;

        loop {
            let readline = prompt.editor.readline(self.prompt());

            match readline {
                Ok(line) => {
                    let Some(command) = ReplCommand::parse(&line) else {
                        continue;
                    };

                    // Only chat text goes to history; never credentials
                    if matches!(command, ReplCommand::Message(_)) {
                        let _ = prompt.editor.add_history_entry(line.trim());
                    }

                    if self.handle(command, &mut prompt).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = prompt.editor.save_history(path);
        }

        Ok(())
    }

    fn prompt(&self) -> &'static str {
        if self.user.is_some() {
            ">>> "
        } else {
            "(signed out) > "
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│                Empathy Chat                 │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
    }

    fn progress(&self) -> Box<dyn ChatProgress> {
        if self.config.show_progress {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(NoProgress)
        }
    }

    /// Pick up a session persisted by an earlier run.
    pub async fn resume(&mut self) {
        match self.auth.resume().await {
            Ok(Some(profile)) => self.enter(profile),
            Ok(None) => println!("{}", ConsoleFormatter::help(false)),
            Err(e) => {
                warn!("Could not resume session: {}", e);
                eprintln!("{}", ConsoleFormatter::error(&e.user_message()));
                println!("{}", ConsoleFormatter::help(false));
            }
        }
    }

    /// Handle one command. Returns true if the REPL should exit.
    pub async fn handle(&mut self, command: ReplCommand, prompt: &mut dyn LinePrompt) -> bool {
        if self.user.is_none() && !command.allowed_signed_out() {
            println!(
                "{}",
                ConsoleFormatter::notice(
                    "Please sign in first with /login, or create an account with /signup."
                )
            );
            return false;
        }

        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => println!("{}", ConsoleFormatter::help(self.user.is_some())),
            ReplCommand::Login(email) => self.login(email, prompt).await,
            ReplCommand::Signup => self.signup(prompt).await,
            ReplCommand::Message(text) => self.send(text).await,
            ReplCommand::New => {
                self.conversation.new_chat();
                self.print_greeting();
            }
            ReplCommand::History => self.show_history().await,
            ReplCommand::Open(target) => self.open(&target).await,
            ReplCommand::WhoAmI => {
                if let Some(user) = &self.user {
                    println!("{}", ConsoleFormatter::whoami(user));
                }
            }
            ReplCommand::Logout => self.logout(),
            ReplCommand::MissingArgument(usage) => {
                println!("{}", ConsoleFormatter::notice(&format!("Usage: {}", usage)));
            }
            ReplCommand::Unknown(name) => {
                println!("Unknown command: {}", name);
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn login(&mut self, email: Option<String>, prompt: &mut dyn LinePrompt) {
        if let Some(user) = &self.user {
            println!(
                "{}",
                ConsoleFormatter::notice(&format!(
                    "Already signed in as {}. Use /logout first.",
                    user.username
                ))
            );
            return;
        }

        let initial = self.pending_username.take().unwrap_or_default();
        let username = match email {
            Some(email) => email,
            None => match prompt.line("Email: ", &initial) {
                Some(username) => username,
                None => return,
            },
        };
        let Some(password) = prompt.secret("Password") else {
            return;
        };

        let credentials = match Credentials::new(username.clone(), password) {
            Ok(credentials) => credentials,
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::error(&e.to_string()));
                self.pending_username = Some(username);
                return;
            }
        };

        let progress = self.progress();
        progress.on_request_start("login");
        let result = self.auth.sign_in(&credentials).await;
        progress.on_request_end("login", result.is_ok());

        match result {
            Ok(profile) => self.enter(profile),
            Err(e) => {
                warn!("Sign in failed: {}", e);
                eprintln!("{}", ConsoleFormatter::error(&e.user_message()));
                self.pending_username = Some(username);
            }
        }
    }

    async fn signup(&mut self, prompt: &mut dyn LinePrompt) {
        if self.user.is_some() {
            println!("{}", ConsoleFormatter::notice("Sign out first to create another account."));
            return;
        }

        let Some(name) = prompt.line("Name: ", "") else {
            return;
        };
        let Some(username) = prompt.line("Email: ", "") else {
            return;
        };
        let Some(password) = prompt.secret("Password") else {
            return;
        };

        let form = match SignupForm::new(name, username, password) {
            Ok(form) => form,
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::error(&e.to_string()));
                return;
            }
        };

        let progress = self.progress();
        progress.on_request_start("signup");
        let result = self.auth.sign_up(&form).await;
        progress.on_request_end("signup", result.is_ok());

        match result {
            Ok(username) => {
                println!(
                    "{}",
                    ConsoleFormatter::notice("Account created. Sign in with /login.")
                );
                self.pending_username = Some(username);
            }
            Err(e) => {
                warn!("Sign up failed: {}", e);
                eprintln!("{}", ConsoleFormatter::error(&e.user_message()));
            }
        }
    }

    fn logout(&mut self) {
        if let Err(e) = self.auth.sign_out() {
            warn!("Sign out did not clear storage: {}", e);
            eprintln!("{}", ConsoleFormatter::error(&e.user_message()));
        }
        self.conversation.reset();
        self.user = None;
        println!("{}", ConsoleFormatter::notice("Signed out."));
    }

    fn enter(&mut self, profile: Profile) {
        self.conversation.reset();
        self.conversation.set_history(profile.history);
        self.user = Some(profile.user);
        self.print_greeting();
    }

    fn print_greeting(&self) {
        if let Some(user) = &self.user {
            let hour = chrono::Local::now().hour();
            println!();
            println!("{}", ConsoleFormatter::greeting(user, hour));
            println!();
        }
    }

    fn initial(&self) -> char {
        self.user.as_ref().map(User::initial).unwrap_or('U')
    }

    async fn send(&mut self, text: String) {
        self.conversation.set_input(text);
        let progress = self.progress();
        let outcome = self.conversation.submit(progress.as_ref()).await;

        match outcome {
            SendOutcome::Replied { .. } | SendOutcome::Failed(_) => {
                let messages = self.conversation.messages();
                if let Some(reply) = messages.last().filter(|m| m.role == Role::Ai) {
                    println!();
                    println!("{}", ConsoleFormatter::message(reply, self.initial()));
                    println!();
                }
            }
            SendOutcome::Rejected(SendRejection::InFlight) => {
                println!("{}", ConsoleFormatter::notice("Still waiting for the previous reply."));
            }
            SendOutcome::Rejected(SendRejection::Loading) => {
                println!("{}", ConsoleFormatter::notice("Still opening a conversation."));
            }
            SendOutcome::Rejected(SendRejection::EmptyInput) | SendOutcome::Superseded => {}
        }
    }

    async fn show_history(&mut self) {
        if let Err(e) = self.conversation.refresh_history().await {
            warn!("Failed to refresh history: {}", e);
            println!(
                "{}",
                ConsoleFormatter::notice("Could not refresh history; showing the last known list.")
            );
        }
        let snapshot = self.conversation.snapshot();
        println!(
            "{}",
            ConsoleFormatter::history(&snapshot.history, snapshot.active_id.as_ref())
        );
    }

    /// Resolve `/open` input: a 1-based index into the history list, or an id.
    fn resolve_target(&self, target: &str) -> Option<ConversationId> {
        if let Ok(index) = target.parse::<usize>() {
            let history = self.conversation.history();
            if let Some(entry) = index.checked_sub(1).and_then(|i| history.get(i)) {
                return Some(entry.id.clone());
            }
        }
        ConversationId::new(target).ok()
    }

    async fn open(&mut self, target: &str) {
        let Some(id) = self.resolve_target(target) else {
            println!("{}", ConsoleFormatter::notice("Usage: /open <n|id>"));
            return;
        };

        let progress = self.progress();
        match self
            .conversation
            .select_with_progress(id, progress.as_ref())
            .await
        {
            SelectOutcome::Loaded { .. } => {
                println!();
                println!(
                    "{}",
                    ConsoleFormatter::transcript(&self.conversation.messages(), self.initial())
                );
                println!();
            }
            SelectOutcome::AlreadyActive => {
                println!("{}", ConsoleFormatter::notice("That conversation is already open."));
            }
            SelectOutcome::Failed(_) => {
                if let Some(error) = self.conversation.take_error() {
                    eprintln!("{}", ConsoleFormatter::error(&error.message));
                }
            }
            SelectOutcome::Stale => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use empathy_application::{
        ApiError, ChatApi, ChatReply, CredentialSlot, KeyValueStore, LoginResponse,
        SessionStore, StoreError,
    };
    use empathy_domain::{ChatInput, HistoryEntry, Message};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // ==================== Test Mocks ====================

    #[derive(Default)]
    struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockApi {
        sends: AtomicUsize,
        profile_down: AtomicBool,
    }

    fn cid(id: &str) -> ConversationId {
        ConversationId::new(id).unwrap()
    }

    #[async_trait]
    impl ChatApi for MockApi {
        async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
            if credentials.password() == "bad" {
                return Err(ApiError::Auth {
                    status: 401,
                    body: "Incorrect username or password".to_string(),
                });
            }
            Ok(LoginResponse {
                access_token: "tok".to_string(),
                token_type: "bearer".to_string(),
            })
        }

        async fn signup(&self, form: &SignupForm) -> Result<User, ApiError> {
            Ok(User::new(form.name(), form.username()))
        }

        async fn fetch_current_user(&self) -> Result<User, ApiError> {
            if self.profile_down.load(Ordering::SeqCst) {
                return Err(ApiError::Network("down".to_string()));
            }
            Ok(User::new("Ann", "a@x.com"))
        }

        async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
            Ok(vec![
                HistoryEntry::new(cid("c2"), "Second"),
                HistoryEntry::new(cid("c1"), "First"),
            ])
        }

        async fn fetch_conversation(&self, id: &ConversationId) -> Result<Vec<Message>, ApiError> {
            match id.as_str() {
                "c1" => Ok(vec![Message::user("hello"), Message::ai("hi")]),
                _ => Err(ApiError::NotFound("Conversation not found".to_string())),
            }
        }

        async fn send_message(
            &self,
            _input: &ChatInput,
            _conversation_id: Option<&ConversationId>,
        ) -> Result<ChatReply, ApiError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(ChatReply {
                ai_response: "I hear you.".to_string(),
                conversation_id: cid("c3"),
                detected_emotion: None,
            })
        }
    }

    /// Answers prompts from a script and records pre-filled values.
    #[derive(Default)]
    struct ScriptedPrompt {
        lines: VecDeque<String>,
        secrets: VecDeque<String>,
        initials: Vec<String>,
    }

    impl ScriptedPrompt {
        fn new(lines: &[&str], secrets: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|s| s.to_string()).collect(),
                secrets: secrets.iter().map(|s| s.to_string()).collect(),
                initials: Vec::new(),
            }
        }
    }

    impl LinePrompt for ScriptedPrompt {
        fn line(&mut self, _prompt: &str, initial: &str) -> Option<String> {
            self.initials.push(initial.to_string());
            self.lines.pop_front()
        }

        fn secret(&mut self, _prompt: &str) -> Option<String> {
            self.secrets.pop_front()
        }
    }

    struct Fixture {
        repl: ChatRepl,
        api: Arc<MockApi>,
        session: Arc<SessionStore>,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(MockApi::default());
        let session = Arc::new(SessionStore::new(
            Arc::new(MemoryStore::default()),
            CredentialSlot::new(),
        ));
        let auth = AuthenticateUseCase::new(api.clone(), session.clone());
        let conversation = Arc::new(ConversationController::new(api.clone()));
        let repl = ChatRepl::new(auth, conversation).with_config(ReplConfig {
            show_progress: false,
            history_file: None,
        });
        Fixture { repl, api, session }
    }

    async fn signed_in() -> Fixture {
        let mut f = fixture();
        let mut prompt = ScriptedPrompt::new(&[], &["pw"]);
        f.repl
            .handle(ReplCommand::Login(Some("a@x.com".into())), &mut prompt)
            .await;
        assert!(f.repl.user().is_some());
        f
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_login_prompts_for_email_and_loads_profile() {
        let mut f = fixture();
        let mut prompt = ScriptedPrompt::new(&["a@x.com"], &["pw"]);

        let exit = f.repl.handle(ReplCommand::Login(None), &mut prompt).await;

        assert!(!exit);
        assert_eq!(f.repl.user().map(|u| u.name.as_str()), Some("Ann"));
        assert!(f.session.is_signed_in());
        assert_eq!(f.repl.conversation.history().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_username_for_retry() {
        let mut f = fixture();
        let mut prompt = ScriptedPrompt::new(&["a@x.com", "a@x.com"], &["bad", "pw"]);

        f.repl.handle(ReplCommand::Login(None), &mut prompt).await;
        assert!(f.repl.user().is_none());
        assert!(!f.session.is_signed_in());

        f.repl.handle(ReplCommand::Login(None), &mut prompt).await;
        assert_eq!(prompt.initials, vec!["".to_string(), "a@x.com".to_string()]);
        assert!(f.repl.user().is_some());
    }

    #[tokio::test]
    async fn test_profile_outage_leaves_no_half_open_session() {
        let mut f = fixture();
        f.api.profile_down.store(true, Ordering::SeqCst);
        let mut prompt = ScriptedPrompt::new(&[], &["pw", "pw"]);

        f.repl
            .handle(ReplCommand::Login(Some("a@x.com".into())), &mut prompt)
            .await;

        assert!(f.repl.user().is_none());
        assert!(!f.session.is_signed_in());
        assert!(f.session.credential().authorization().is_none());

        // Once the service is back a plain retry signs in
        f.api.profile_down.store(false, Ordering::SeqCst);
        f.repl
            .handle(ReplCommand::Login(Some("a@x.com".into())), &mut prompt)
            .await;
        assert!(f.repl.user().is_some());
        assert!(f.session.is_signed_in());
    }

    #[tokio::test]
    async fn test_signup_prefills_next_login() {
        let mut f = fixture();
        let mut prompt = ScriptedPrompt::new(&["Bob", "b@x.com", "b@x.com"], &["pw", "pw"]);

        f.repl.handle(ReplCommand::Signup, &mut prompt).await;
        assert!(f.repl.user().is_none());
        assert!(!f.session.is_signed_in());

        f.repl.handle(ReplCommand::Login(None), &mut prompt).await;
        assert_eq!(prompt.initials.last().map(String::as_str), Some("b@x.com"));
    }

    #[tokio::test]
    async fn test_messages_require_sign_in() {
        let mut f = fixture();
        let mut prompt = ScriptedPrompt::default();

        f.repl
            .handle(ReplCommand::Message("hello".into()), &mut prompt)
            .await;

        assert_eq!(f.api.sends.load(Ordering::SeqCst), 0);
        assert!(f.repl.conversation.messages().is_empty());
    }

    #[tokio::test]
    async fn test_message_round_trip() {
        let mut f = signed_in().await;
        let mut prompt = ScriptedPrompt::default();

        f.repl
            .handle(ReplCommand::Message("I feel tired".into()), &mut prompt)
            .await;

        assert_eq!(f.api.sends.load(Ordering::SeqCst), 1);
        let messages = f.repl.conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::ai("I hear you."));
        assert_eq!(f.repl.conversation.active_id(), Some(cid("c3")));
    }

    #[tokio::test]
    async fn test_open_by_index() {
        let mut f = signed_in().await;
        let mut prompt = ScriptedPrompt::default();

        f.repl.handle(ReplCommand::Open("2".into()), &mut prompt).await;

        assert_eq!(f.repl.conversation.active_id(), Some(cid("c1")));
        assert_eq!(f.repl.conversation.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_open_unknown_id_keeps_draft() {
        let mut f = signed_in().await;
        let mut prompt = ScriptedPrompt::default();

        f.repl
            .handle(ReplCommand::Open("missing".into()), &mut prompt)
            .await;

        assert!(f.repl.conversation.active_id().is_none());
        // The error was shown and dismissed
        assert!(f.repl.conversation.take_error().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let mut f = signed_in().await;
        let mut prompt = ScriptedPrompt::default();
        f.repl.handle(ReplCommand::Open("c1".into()), &mut prompt).await;

        f.repl.handle(ReplCommand::Logout, &mut prompt).await;

        assert!(f.repl.user().is_none());
        assert!(!f.session.is_signed_in());
        assert!(f.repl.conversation.messages().is_empty());
        assert!(f.repl.conversation.history().is_empty());
    }

    #[tokio::test]
    async fn test_resume_restores_persisted_session() {
        let mut f = fixture();
        f.session
            .set(empathy_domain::SessionToken::new("tok").unwrap())
            .unwrap();

        f.repl.resume().await;

        assert!(f.repl.user().is_some());
        assert_eq!(f.repl.conversation.history().len(), 2);
    }

    #[tokio::test]
    async fn test_quit_exits() {
        let mut f = fixture();
        let mut prompt = ScriptedPrompt::default();
        assert!(f.repl.handle(ReplCommand::Quit, &mut prompt).await);
    }
}
