//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::ConsoleSettings;
use crate::domain::UserRole;

/// `chatbot-console` arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chatbot-console",
    about = "Manage chatbots, knowledge and billing through the platform API",
    version
)]
pub struct Cli {
    /// Connection overrides applied on top of environment and config files.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Flags that override [`ConsoleSettings`].
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Backend origin, e.g. `https://api.example.com`.
    #[arg(long = "base-url", value_name = "url", global = true)]
    pub base_url: Option<String>,
    /// Path announced when the backend rejects the credential.
    #[arg(long = "base-path", value_name = "path", global = true)]
    pub base_path: Option<String>,
    /// Path announced after logout.
    #[arg(long = "login-path", value_name = "path", global = true)]
    pub login_path: Option<String>,
    /// File holding the persisted credential.
    #[arg(long = "token-file", value_name = "path", global = true)]
    pub token_file: Option<PathBuf>,
}

impl GlobalArgs {
    /// Overlay the flags that were given onto `settings`.
    pub fn apply_to(self, settings: &mut ConsoleSettings) {
        if let Some(base_url) = self.base_url {
            settings.base_url = base_url;
        }
        if let Some(base_path) = self.base_path {
            settings.base_path = base_path;
        }
        if let Some(login_path) = self.login_path {
            settings.login_path = login_path;
        }
        if let Some(token_file) = self.token_file {
            settings.token_file = Some(token_file);
        }
    }
}

/// Top-level operations.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Exchange email and password for a credential and store it.
    Login(LoginArgs),
    /// Register an account and store the credential it is issued.
    Signup(SignupArgs),
    /// Discard the stored credential.
    Logout,
    /// Show the signed-in account and the credential's claims.
    Whoami,
    /// Show or update the account profile.
    Profile {
        /// Omit to show the profile.
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// List, create or delete chatbots.
    Chatbots {
        /// Omit to list chatbots.
        #[command(subcommand)]
        action: Option<ChatbotsAction>,
    },
    /// Show or update a chatbot's widget settings.
    Settings {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
        /// Omit to show the settings.
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Generate the widget embed script.
    Embed {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
    },
    /// List or add domains allowed to embed a chatbot.
    Domains {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
        /// Domain to allow before listing.
        #[arg(long, value_name = "domain")]
        add: Option<String>,
    },
    /// Usage counters and recent visitor queries.
    Analytics {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
    },
    /// Manage knowledge categories.
    Categories {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
        /// Omit to list categories.
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },
    /// Manage questions filed under categories.
    Questions {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
        /// Question operation.
        #[command(subcommand)]
        action: QuestionsAction,
    },
    /// Manage questions answered regardless of category.
    GeneralQuestions {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
        /// Omit to list general questions.
        #[command(subcommand)]
        action: Option<GeneralQuestionsAction>,
    },
    /// Manage knowledge files.
    Files {
        /// Chatbot identifier.
        #[arg(long = "chatbot", short = 'c', value_name = "id")]
        chatbot_id: u64,
        /// Omit to list files.
        #[command(subcommand)]
        action: Option<FilesAction>,
    },
    /// List or create subscription plans.
    Plans {
        /// Omit to list plans.
        #[command(subcommand)]
        action: Option<PlansAction>,
    },
    /// Show the active subscription or subscribe to a plan.
    Subscription {
        /// Plan to subscribe to before showing the subscription.
        #[arg(long, value_name = "plan-id")]
        subscribe: Option<u64>,
    },
    /// Generate an image from a text prompt.
    GenerateImage(GenerateImageArgs),
    /// Send an arbitrary request through the pipeline.
    Request(RawRequestArgs),
}

/// `login` arguments.
#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    /// Account email.
    #[arg(long, value_name = "email")]
    pub email: String,
    /// Password; read from the first line of stdin when omitted.
    #[arg(long, value_name = "password")]
    pub password: Option<String>,
}

/// `signup` arguments.
#[derive(Debug, Clone, Args)]
pub struct SignupArgs {
    /// Account email.
    #[arg(long, value_name = "email")]
    pub email: String,
    /// Password; read from the first line of stdin when omitted.
    #[arg(long, value_name = "password")]
    pub password: Option<String>,
    /// Company shown on the profile.
    #[arg(long = "company", value_name = "name")]
    pub company_name: Option<String>,
    /// Account role (`admin` or `editor`).
    #[arg(long = "role", value_name = "role", default_value = "admin")]
    pub user_type: UserRole,
    /// Admin account an editor belongs to.
    #[arg(long = "parent", value_name = "id")]
    pub parent_id: Option<u64>,
}

/// `profile` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum ProfileAction {
    /// Change the company name.
    SetCompany {
        /// New company name.
        name: String,
    },
}

/// `chatbots` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum ChatbotsAction {
    /// Create a chatbot.
    Create {
        /// Display name.
        #[arg(long, value_name = "name")]
        name: String,
        /// Greeting shown when the widget opens.
        #[arg(long, value_name = "text", default_value = "")]
        message: String,
    },
    /// Delete a chatbot.
    Delete {
        /// Chatbot identifier.
        id: u64,
    },
}

/// `settings` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum SettingsAction {
    /// Replace name, greeting and optionally the logo.
    Update {
        /// Display name.
        #[arg(long, value_name = "name")]
        name: String,
        /// Greeting shown when the widget opens.
        #[arg(long, value_name = "text", default_value = "")]
        message: String,
        /// Logo image to upload.
        #[arg(long, value_name = "path")]
        logo: Option<PathBuf>,
    },
}

/// `categories` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum CategoriesAction {
    /// Add a category.
    Create {
        /// Category name.
        #[arg(long, value_name = "name")]
        name: String,
        /// Parent category for nesting.
        #[arg(long = "parent", value_name = "id")]
        parent_id: Option<u64>,
    },
    /// Remove a category.
    Delete {
        /// Category identifier.
        id: u64,
    },
    /// Upload the image shown for a category.
    Image {
        /// Category identifier.
        id: u64,
        /// Image file.
        #[arg(long, value_name = "path")]
        file: PathBuf,
    },
}

/// `questions` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum QuestionsAction {
    /// Questions filed under a category.
    List {
        /// Category identifier.
        #[arg(long = "category", value_name = "id")]
        category_id: u64,
    },
    /// Add a question to a category.
    Create {
        /// Category identifier.
        #[arg(long = "category", value_name = "id")]
        category_id: u64,
        /// Prompt text.
        #[arg(long, value_name = "text")]
        question: String,
        /// Reply text.
        #[arg(long, value_name = "text")]
        answer: String,
    },
    /// Remove a question.
    Delete {
        /// Question identifier.
        id: u64,
    },
}

/// `general-questions` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum GeneralQuestionsAction {
    /// Add a general question.
    Create {
        /// Prompt text.
        #[arg(long, value_name = "text")]
        question: String,
        /// Reply text.
        #[arg(long, value_name = "text")]
        answer: String,
    },
    /// Remove a general question.
    Delete {
        /// Document identifier.
        id: String,
    },
}

/// `files` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum FilesAction {
    /// Upload a knowledge file.
    Upload {
        /// File to upload.
        path: PathBuf,
        /// Title shown in listings; defaults to the file name.
        #[arg(long, value_name = "title")]
        title: Option<String>,
        /// MIME type; guessed from the extension when omitted.
        #[arg(long = "type", value_name = "mime")]
        file_type: Option<String>,
    },
    /// Download a knowledge file.
    Download {
        /// File identifier.
        id: u64,
        /// Destination path.
        #[arg(long, short = 'o', value_name = "path")]
        output: PathBuf,
    },
    /// Remove a knowledge file.
    Delete {
        /// File identifier.
        id: u64,
    },
}

/// `plans` operations.
#[derive(Debug, Clone, Subcommand)]
pub enum PlansAction {
    /// Create a plan.
    Create {
        /// Plan name.
        #[arg(long, value_name = "name")]
        name: String,
        /// Marketing copy.
        #[arg(long, value_name = "text", default_value = "")]
        description: String,
        /// Price per billing period.
        #[arg(long, value_name = "amount")]
        price: f64,
        /// Feature bullet point; repeat for several.
        #[arg(long = "feature", value_name = "text")]
        features: Vec<String>,
    },
}

/// `generate-image` arguments.
#[derive(Debug, Clone, Args)]
pub struct GenerateImageArgs {
    /// Text prompt.
    pub prompt: String,
    /// Output width in pixels.
    #[arg(long, default_value_t = 600)]
    pub width: u32,
    /// Output height in pixels.
    #[arg(long, default_value_t = 600)]
    pub height: u32,
    /// Destination path for the image bytes.
    #[arg(long, short = 'o', value_name = "path")]
    pub output: PathBuf,
}

/// How a raw request is sent and its response interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Credential attached; envelope checked; prints `data`.
    #[default]
    Authenticated,
    /// No credential; envelope checked; a returned token is stored.
    Public,
    /// No credential; prints the body without envelope checks.
    Raw,
    /// Credential attached; writes the raw bytes to `--output`.
    Binary,
}

/// `request` arguments.
#[derive(Debug, Clone, Args)]
pub struct RawRequestArgs {
    /// HTTP verb (`GET`, `POST`, `PUT` or `DELETE`).
    pub method: String,
    /// Path below the base URL, e.g. `/api/v1/chatbots`.
    pub path: String,
    /// JSON request body.
    #[arg(long, value_name = "json")]
    pub data: Option<String>,
    /// Extra header as `Name: value`; repeat for several.
    #[arg(long = "header", short = 'H', value_name = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Request mode.
    #[arg(long, value_enum, default_value_t = Mode::Authenticated)]
    pub mode: Mode,
    /// Destination path for binary responses.
    #[arg(long, short = 'o', value_name = "path", required_if_eq("mode", "binary"))]
    pub output: Option<PathBuf>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header `{raw}` must look like `Name: value`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header `{raw}` has an empty name"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}
