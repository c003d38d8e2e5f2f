//! Command-line console.
//!
//! [`Cli`] is the clap surface, [`Console`] executes a parsed [`Command`] and
//! returns JSON for stdout, and [`drain_redirects`] reports the navigation
//! requests a browser host would have acted on.

mod args;
mod error;
mod local_files;
mod run;

pub use args::{
    CategoriesAction, ChatbotsAction, Cli, Command, FilesAction, GeneralQuestionsAction,
    GenerateImageArgs, GlobalArgs, LoginArgs, Mode, PlansAction, ProfileAction, QuestionsAction,
    RawRequestArgs, SettingsAction, SignupArgs,
};
pub use error::CliError;
pub use run::{Console, drain_redirects};
