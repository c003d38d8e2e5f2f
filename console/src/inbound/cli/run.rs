//! Command execution against the domain services.

use std::io::BufRead;
use std::path::Path;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use super::args::{
    CategoriesAction, ChatbotsAction, Command, FilesAction, GeneralQuestionsAction, LoginArgs,
    Mode, PlansAction, ProfileAction, QuestionsAction, RawRequestArgs, SettingsAction, SignupArgs,
};
use super::error::CliError;
use super::local_files::{content_type_for, read_upload, write_output};
use crate::domain::endpoints::{
    ChatbotDraft, ConsoleApi, DomainName, FileUpload, ImagePrompt, NewCategory, NewPlan,
    QuestionDraft,
};
use crate::domain::{
    ApiError, ApiRequest, AuthSession, LoginCredentials, SessionEvent, SignupRequest,
};

/// Runs parsed commands and renders their results as JSON.
#[derive(Clone)]
pub struct Console {
    auth: AuthSession,
    api: ConsoleApi,
}

impl Console {
    /// Console over an auth session and the endpoints sharing its dispatcher.
    pub fn new(auth: AuthSession, api: ConsoleApi) -> Self {
        Self { auth, api }
    }

    /// Execute `command`, reading a missing password from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when input validation, local file access or the
    /// backend call fails.
    pub async fn execute(
        &self,
        command: Command,
        input: &mut dyn BufRead,
    ) -> Result<Value, CliError> {
        match command {
            Command::Login(args) => self.login(args, input).await,
            Command::Signup(args) => self.signup(args, input).await,
            Command::Logout => {
                self.auth.logout()?;
                Ok(json!({ "logged_out": true }))
            }
            Command::Whoami => self.whoami().await,
            Command::Profile { action } => self.profile(action).await,
            Command::Chatbots { action } => self.chatbots(action).await,
            Command::Settings { chatbot_id, action } => self.settings(chatbot_id, action).await,
            Command::Embed { chatbot_id } => render(&self.api.embed_script(chatbot_id).await?),
            Command::Domains { chatbot_id, add } => self.domains(chatbot_id, add).await,
            Command::Analytics { chatbot_id } => render(&self.api.analytics(chatbot_id).await?),
            Command::Categories { chatbot_id, action } => {
                self.categories(chatbot_id, action).await
            }
            Command::Questions { chatbot_id, action } => self.questions(chatbot_id, action).await,
            Command::GeneralQuestions { chatbot_id, action } => {
                self.general_questions(chatbot_id, action).await
            }
            Command::Files { chatbot_id, action } => self.files(chatbot_id, action).await,
            Command::Plans { action } => self.plans(action).await,
            Command::Subscription { subscribe } => {
                if let Some(plan_id) = subscribe {
                    self.api.subscribe(plan_id).await?;
                }
                render(&self.api.subscription().await?)
            }
            Command::GenerateImage(args) => {
                let prompt = ImagePrompt::new(&args.prompt)?.with_size(args.width, args.height);
                let bytes = self.api.generate_image(&prompt).await?;
                saved(&args.output, &bytes)
            }
            Command::Request(args) => self.raw_request(args).await,
        }
    }

    async fn login(&self, args: LoginArgs, input: &mut dyn BufRead) -> Result<Value, CliError> {
        let password = resolve_password(args.password, input)?;
        let credentials = LoginCredentials::try_from_parts(&args.email, &password)?;
        self.auth.login(&credentials).await?;
        Ok(json!({ "logged_in": true, "email": credentials.email() }))
    }

    async fn signup(&self, args: SignupArgs, input: &mut dyn BufRead) -> Result<Value, CliError> {
        let password = resolve_password(args.password, input)?;
        let credentials = LoginCredentials::try_from_parts(&args.email, &password)?;
        let request =
            SignupRequest::new(credentials, args.company_name, args.user_type, args.parent_id)?;
        self.auth.signup(&request).await?;
        Ok(json!({
            "signed_up": true,
            "email": request.credentials().email(),
            "user_type": request.user_type().as_str(),
        }))
    }

    async fn whoami(&self) -> Result<Value, CliError> {
        let credential = self.auth.require_authenticated()?;
        let profile = self.api.me().await?;
        Ok(json!({
            "email": profile.email,
            "user_type": profile.user_type,
            "session": self.auth.dispatcher().session().header(),
            "claims": credential.claims(),
        }))
    }

    async fn profile(&self, action: Option<ProfileAction>) -> Result<Value, CliError> {
        if let Some(ProfileAction::SetCompany { name }) = action {
            self.api.update_company(name.trim()).await?;
        }
        render(&self.api.profile().await?)
    }

    async fn chatbots(&self, action: Option<ChatbotsAction>) -> Result<Value, CliError> {
        match action {
            None => render(&self.api.list_chatbots().await?),
            Some(ChatbotsAction::Create { name, message }) => {
                self.api
                    .create_chatbot(ChatbotDraft::new(&name, &message)?)
                    .await?;
                render(&self.api.list_chatbots().await?)
            }
            Some(ChatbotsAction::Delete { id }) => {
                self.api.delete_chatbot(id).await?;
                Ok(json!({ "deleted": id }))
            }
        }
    }

    async fn settings(
        &self,
        chatbot_id: u64,
        action: Option<SettingsAction>,
    ) -> Result<Value, CliError> {
        if let Some(SettingsAction::Update {
            name,
            message,
            logo,
        }) = action
        {
            let mut draft = ChatbotDraft::new(&name, &message)?;
            if let Some(path) = logo {
                draft = draft.with_logo(read_upload(&path)?);
            }
            self.api.update_settings(chatbot_id, draft).await?;
        }
        render(&self.api.settings(chatbot_id).await?)
    }

    async fn domains(&self, chatbot_id: u64, add: Option<String>) -> Result<Value, CliError> {
        if let Some(raw) = add {
            let domain = DomainName::parse(&raw)?;
            self.api.add_allowed_domain(chatbot_id, &domain).await?;
        }
        render(&self.api.allowed_domains(chatbot_id).await?)
    }

    async fn categories(
        &self,
        chatbot_id: u64,
        action: Option<CategoriesAction>,
    ) -> Result<Value, CliError> {
        match action {
            None => {}
            Some(CategoriesAction::Create { name, parent_id }) => {
                let category = NewCategory::new(&name, parent_id)?;
                self.api.create_category(chatbot_id, &category).await?;
            }
            Some(CategoriesAction::Delete { id }) => {
                self.api.delete_category(chatbot_id, id).await?;
            }
            Some(CategoriesAction::Image { id, file }) => {
                let image = read_upload(&file)?;
                self.api
                    .upload_category_image(chatbot_id, id, image)
                    .await?;
            }
        }
        render(&self.api.categories(chatbot_id).await?)
    }

    async fn questions(&self, chatbot_id: u64, action: QuestionsAction) -> Result<Value, CliError> {
        match action {
            QuestionsAction::List { category_id } => {
                render(&self.api.questions(chatbot_id, category_id).await?)
            }
            QuestionsAction::Create {
                category_id,
                question,
                answer,
            } => {
                let draft = QuestionDraft::new(&question, &answer)?;
                self.api
                    .create_question(chatbot_id, category_id, &draft)
                    .await?;
                render(&self.api.questions(chatbot_id, category_id).await?)
            }
            QuestionsAction::Delete { id } => {
                self.api.delete_question(id).await?;
                Ok(json!({ "deleted": id }))
            }
        }
    }

    async fn general_questions(
        &self,
        chatbot_id: u64,
        action: Option<GeneralQuestionsAction>,
    ) -> Result<Value, CliError> {
        match action {
            None => {}
            Some(GeneralQuestionsAction::Create { question, answer }) => {
                let draft = QuestionDraft::new(&question, &answer)?;
                self.api.create_general_question(chatbot_id, &draft).await?;
            }
            Some(GeneralQuestionsAction::Delete { id }) => {
                self.api.delete_general_question(chatbot_id, &id).await?;
            }
        }
        render(&self.api.general_questions(chatbot_id).await?)
    }

    async fn files(&self, chatbot_id: u64, action: Option<FilesAction>) -> Result<Value, CliError> {
        match action {
            None => {}
            Some(FilesAction::Upload {
                path,
                title,
                file_type,
            }) => {
                let upload = read_upload(&path)?;
                let title = title.unwrap_or_else(|| upload.file_name.clone());
                let file_type = file_type.unwrap_or_else(|| content_type_for(&path).to_owned());
                let file = FileUpload::new(&title, &file_type, upload.bytes)?;
                self.api.upload_file(chatbot_id, &file).await?;
            }
            Some(FilesAction::Download { id, output }) => {
                let content = self.api.download_file(chatbot_id, id).await?;
                let mut summary = saved(&output, &content.bytes)?;
                summary["file_type"] = Value::from(content.file_type);
                return Ok(summary);
            }
            Some(FilesAction::Delete { id }) => {
                self.api.delete_file(chatbot_id, id).await?;
            }
        }
        render(&self.api.files(chatbot_id).await?)
    }

    async fn plans(&self, action: Option<PlansAction>) -> Result<Value, CliError> {
        if let Some(PlansAction::Create {
            name,
            description,
            price,
            features,
        }) = action
        {
            let plan = NewPlan::new(&name, &description, price, features)?;
            self.api.create_plan(&plan).await?;
        }
        render(&self.api.plans().await?)
    }

    async fn raw_request(&self, args: RawRequestArgs) -> Result<Value, CliError> {
        let mut request =
            ApiRequest::from_method_name(&args.method, args.path).map_err(ApiError::from)?;
        if let Some(raw) = args.data {
            request = request.with_json(serde_json::from_str(&raw)?);
        }
        for (name, value) in args.headers {
            request = request.with_header(name, value);
        }

        let dispatcher = self.api.dispatcher();
        match args.mode {
            Mode::Authenticated => Ok(dispatcher.call(request).await?),
            Mode::Public => Ok(dispatcher.call_without_auth(request).await?),
            Mode::Raw => Ok(dispatcher.call_public_raw(request).await?),
            Mode::Binary => {
                let output = args.output.ok_or(CliError::MissingOutput)?;
                let bytes = dispatcher.call_binary(request).await?;
                saved(&output, &bytes)
            }
        }
    }
}

fn render<T: Serialize>(value: &T) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}

fn saved(output: &Path, bytes: &[u8]) -> Result<Value, CliError> {
    write_output(output, bytes)?;
    Ok(json!({
        "output": output.display().to_string(),
        "bytes": bytes.len(),
    }))
}

/// Use `given`, or the first line of `input` without its line ending.
pub(crate) fn resolve_password(
    given: Option<String>,
    input: &mut dyn BufRead,
) -> Result<String, CliError> {
    if let Some(password) = given {
        return Ok(password);
    }
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|error| CliError::file("read password from", "<stdin>", error))?;
    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);
    Ok(line)
}

/// Log and collect redirect targets announced while a command ran.
///
/// The CLI has no page to navigate, so each target is reported instead.
pub fn drain_redirects(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<String> {
    let mut targets = Vec::new();
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Redirect { target, reason }) => {
                info!(redirect_to = %target, ?reason, "host would navigate");
                targets.push(target);
            }
            Ok(SessionEvent::HeaderUpdated(header)) => {
                debug!(user_type = %header.user_type, user_id = %header.user_id, "session header updated");
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "session events dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    //! Command execution against a mocked transport.

    use std::io::Cursor;
    use std::sync::Arc;

    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{
        InMemoryKeyValueStore, MockHttpTransport, TransportError, TransportResponse,
    };
    use crate::domain::{DispatcherConfig, RedirectReason, RequestDispatcher, TOKEN_KEY};

    fn token() -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"7","user_type":"admin"}"#);
        format!("{header}.{payload}.c2ln")
    }

    fn console(transport: MockHttpTransport, stored: Option<&str>) -> Console {
        let storage = match stored {
            Some(value) => InMemoryKeyValueStore::with_slot(TOKEN_KEY, value),
            None => InMemoryKeyValueStore::default(),
        };
        let dispatcher = RequestDispatcher::new(
            Arc::new(transport),
            Arc::new(storage),
            DispatcherConfig::new("http://backend.test"),
        );
        Console::new(
            AuthSession::new(dispatcher.clone(), "/login"),
            ConsoleApi::new(dispatcher),
        )
    }

    fn no_input() -> Cursor<Vec<u8>> {
        Cursor::new(Vec::new())
    }

    #[rstest]
    #[case(Some("given".to_owned()), "ignored\n", "given")]
    #[case(None, "from stdin\r\nsecond line\n", "from stdin")]
    #[case(None, "", "")]
    fn password_comes_from_flag_or_first_line(
        #[case] given: Option<String>,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        assert_eq!(
            resolve_password(given, &mut reader).expect("password resolves"),
            expected
        );
    }

    #[tokio::test]
    async fn login_reads_password_from_input_and_hides_token() {
        let issued = token();
        let reply = TransportResponse::json(200, &json!({ "status": 1, "data": { "token": issued } }));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| request.url == "http://backend.test/api/v1/auth/login")
            .times(1)
            .return_once(move |_| Ok(reply));
        let console = console(transport, None);

        let output = console
            .execute(
                Command::Login(LoginArgs {
                    email: "ops@example.com".into(),
                    password: None,
                }),
                &mut Cursor::new(b"hunter2\n".to_vec()),
            )
            .await
            .expect("login succeeds");

        assert_eq!(output, json!({ "logged_in": true, "email": "ops@example.com" }));
        assert!(console.auth.is_authenticated());
    }

    #[tokio::test]
    async fn blank_password_never_reaches_the_backend() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();
        let console = console(transport, None);

        let error = console
            .execute(
                Command::Login(LoginArgs {
                    email: "ops@example.com".into(),
                    password: None,
                }),
                &mut no_input(),
            )
            .await
            .expect_err("password is required");

        assert_eq!(error.normalized().code, 400);
    }

    #[tokio::test]
    async fn logout_announces_the_login_page() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();
        let console = console(transport, Some(&token()));
        let mut events = console.auth.dispatcher().session().subscribe();

        let output = console
            .execute(Command::Logout, &mut no_input())
            .await
            .expect("logout succeeds");

        assert_eq!(output, json!({ "logged_out": true }));
        assert_eq!(drain_redirects(&mut events), ["/login"]);
        assert!(!console.auth.is_authenticated());
    }

    #[tokio::test]
    async fn expired_credential_redirects_to_base_path() {
        let reply = TransportResponse::json(401, &json!({ "message": "jwt expired" }));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .return_once(move |_| Ok(reply));
        let console = console(transport, Some(&token()));
        let mut events = console.auth.dispatcher().session().subscribe();

        let error = console
            .execute(Command::Chatbots { action: None }, &mut no_input())
            .await
            .expect_err("backend rejects credential");

        assert_eq!(error.normalized().code, 401);
        assert_eq!(drain_redirects(&mut events), ["/"]);
    }

    #[tokio::test]
    async fn whoami_requires_a_credential() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();
        let console = console(transport, None);

        let error = console
            .execute(Command::Whoami, &mut no_input())
            .await
            .expect_err("no credential stored");

        assert!(matches!(error, CliError::Api(ApiError::Unauthorized)));
        assert_eq!(error.normalized().code, 500);
    }

    #[tokio::test]
    async fn whoami_combines_profile_and_claims() {
        let reply = TransportResponse::json(
            200,
            &json!({
                "status": 1,
                "data": { "user": { "email": "ops@example.com", "user_type": "admin" } },
                "header": { "user_type": "admin", "user_id": 7 },
            }),
        );
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| request.url.ends_with("/api/v1/profile/me"))
            .return_once(move |_| Ok(reply));
        let console = console(transport, Some(&token()));

        let output = console
            .execute(Command::Whoami, &mut no_input())
            .await
            .expect("whoami succeeds");

        assert_eq!(output["email"], "ops@example.com");
        assert_eq!(output["session"], json!({ "user_type": "admin", "user_id": "7" }));
        assert_eq!(output["claims"]["sub"], "7");
    }

    #[tokio::test]
    async fn raw_request_rejects_unknown_verbs_before_sending() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();
        let console = console(transport, Some(&token()));

        let error = console
            .execute(
                Command::Request(RawRequestArgs {
                    method: "patch".into(),
                    path: "/api/v1/profile".into(),
                    data: None,
                    headers: Vec::new(),
                    mode: Mode::Authenticated,
                    output: None,
                }),
                &mut no_input(),
            )
            .await
            .expect_err("PATCH is unsupported");

        assert_eq!(
            error.normalized().message,
            "Unsupported HTTP method: PATCH"
        );
    }

    #[tokio::test]
    async fn raw_public_request_forwards_body_and_headers() {
        let reply = TransportResponse::json(200, &json!({ "status": 1, "data": { "ok": true } }));
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.header("authorization").is_none()
                    && request.header("x-trace") == Some("abc")
            })
            .return_once(move |_| Ok(reply));
        let console = console(transport, None);

        let output = console
            .execute(
                Command::Request(RawRequestArgs {
                    method: "post".into(),
                    path: "/api/v1/ping".into(),
                    data: Some(r#"{"hello":"world"}"#.into()),
                    headers: vec![("X-Trace".into(), "abc".into())],
                    mode: Mode::Public,
                    output: None,
                }),
                &mut no_input(),
            )
            .await
            .expect("public call succeeds");

        assert_eq!(output, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn generated_image_is_written_to_output() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output = dir.path().join("art.png");
        let mut transport = MockHttpTransport::new();
        transport.expect_send().return_once(|_| {
            Ok(TransportResponse {
                status: 200,
                body: vec![1, 2, 3],
            })
        });
        let console = console(transport, Some(&token()));

        let summary = console
            .execute(
                Command::GenerateImage(super::super::args::GenerateImageArgs {
                    prompt: "a lighthouse".into(),
                    width: 600,
                    height: 600,
                    output: output.clone(),
                }),
                &mut no_input(),
            )
            .await
            .expect("image generated");

        assert_eq!(summary["bytes"], 3);
        assert_eq!(std::fs::read(&output).expect("read image"), [1, 2, 3]);
    }

    #[tokio::test]
    async fn network_failures_surface_as_server_errors() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .return_once(|_| Err(TransportError::network("connection refused")));
        let console = console(transport, Some(&token()));

        let error = console
            .execute(Command::Plans { action: None }, &mut no_input())
            .await
            .expect_err("transport fails");

        let normalized = error.normalized();
        assert_eq!(normalized.code, 500);
        assert!(normalized.message.contains("connection refused"));
    }

    #[test]
    fn drain_skips_header_updates() {
        let session = crate::domain::SessionContext::new();
        let mut events = session.subscribe();
        session.publish_header(crate::domain::SessionHeader {
            user_type: "admin".into(),
            user_id: "1".into(),
        });
        session.request_redirect("/", RedirectReason::AuthExpired);

        assert_eq!(drain_redirects(&mut events), ["/"]);
        assert!(drain_redirects(&mut events).is_empty());
    }
}
