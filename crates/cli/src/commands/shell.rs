//! Interactive session.
//!
//! Unlike the one-shot commands, the shell keeps its dashboards between
//! commands, so the voter dashboard's vote lock lasts until logout or
//! session expiry.
//!
//! ```text
//! login> login alice wonderland
//! alice> vote 3
//! alice> submit Bike racks | Covered racks by the entrance
//! alice> logout
//! ```

use secrecy::SecretString;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;
use upvote_client::forms::{IdeaForm, SUBMITTED_MESSAGE, login, register};
use upvote_client::{AdminDashboard, ApiClient, AuthApi, Shell, View, VoterDashboard};
use upvote_core::{CurrentUser, IdeaId};

use super::{Context, admin, confirm};
use crate::error::CliError;
use crate::render;

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Help,
    Quit,
    Switch,
    Login { username: String, password: String },
    Register { username: String, email: String, password: String },
    Whoami,
    Logout,
    Refresh,
    Vote(IdeaId),
    Submit { title: String, description: String },
    Approve(IdeaId),
    Delete(IdeaId),
}

fn parse_id(arg: Option<&str>, usage: &str) -> Result<IdeaId, String> {
    arg.ok_or_else(|| format!("Usage: {usage}"))?
        .parse()
        .map_err(|e| format!("{e}"))
}

/// Parse a shell line.
///
/// # Errors
///
/// Returns a usage message for unknown commands or wrong arguments.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let input = match command {
        "" => Input::Empty,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "switch" => Input::Switch,
        "whoami" => Input::Whoami,
        "logout" => Input::Logout,
        "refresh" | "list" => Input::Refresh,
        "login" => match args.as_slice() {
            [username, password] => Input::Login {
                username: (*username).to_string(),
                password: (*password).to_string(),
            },
            _ => return Err("Usage: login <username> <password>".to_string()),
        },
        "register" => match args.as_slice() {
            [username, email, password] => Input::Register {
                username: (*username).to_string(),
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            _ => return Err("Usage: register <username> <email> <password>".to_string()),
        },
        "vote" => Input::Vote(parse_id(args.first().copied(), "vote <id>")?),
        "approve" => Input::Approve(parse_id(args.first().copied(), "approve <id>")?),
        "delete" => Input::Delete(parse_id(args.first().copied(), "delete <id>")?),
        "submit" => {
            let (title, description) = rest
                .split_once('|')
                .ok_or_else(|| "Usage: submit <title> | <description>".to_string())?;
            Input::Submit {
                title: title.trim().to_string(),
                description: description.trim().to_string(),
            }
        }
        other => return Err(format!("Unknown command `{other}`. Type `help`.")),
    };
    Ok(input)
}

fn help(view: &View) -> &'static str {
    match view {
        View::Login => {
            "login <username> <password>   sign in\n\
             switch                        go to registration\n\
             quit                          leave"
        }
        View::Register => {
            "register <username> <email> <password>   create an account and sign in\n\
             switch                                   go to sign-in\n\
             quit                                     leave"
        }
        View::Voter(_) => {
            "refresh                          reload the approved ideas\n\
             vote <id>                        vote for an idea (once per session)\n\
             submit <title> | <description>   propose an idea\n\
             whoami                           show the signed-in user\n\
             logout                           sign out\n\
             quit                             leave"
        }
        View::Admin(_) => {
            "refresh        reload both lists\n\
             approve <id>   approve a pending idea\n\
             delete <id>    delete an idea (asks first)\n\
             whoami         show the signed-in user\n\
             logout         sign out\n\
             quit           leave"
        }
    }
}

struct Repl {
    client: ApiClient,
    shell: Shell,
    voter: Option<VoterDashboard<ApiClient>>,
    admin: Option<AdminDashboard<ApiClient>>,
}

impl Repl {
    fn new(client: ApiClient) -> Self {
        let shell = Shell::new(client.session().clone());
        Self {
            client,
            shell,
            voter: None,
            admin: None,
        }
    }

    fn prompt(&mut self) -> String {
        match self.shell.view() {
            View::Login => "login> ".to_string(),
            View::Register => "register> ".to_string(),
            View::Voter(user) => format!("{}> ", user.username),
            View::Admin(user) => format!("{} (admin)> ", user.username),
        }
    }

    /// Render the current view.
    fn show(&mut self) {
        match self.shell.view() {
            View::Login => render::emit(
                "Sign in with `login <username> <password>`, or type `switch` to register.",
            ),
            View::Register => render::emit(
                "Register with `register <username> <email> <password>`, or type `switch` to sign in.",
            ),
            View::Voter(_) => {
                if let Some(dashboard) = &self.voter {
                    render::emit(&render::voter_view(dashboard.state()));
                }
            }
            View::Admin(_) => {
                if let Some(dashboard) = &self.admin {
                    render::emit(&admin::view(dashboard));
                }
            }
        }
    }

    /// Record a signed-in user and mount the dashboard for their role.
    async fn enter(&mut self, user: CurrentUser) {
        render::emit(&render::user_line(&user));
        let is_admin = user.is_admin();
        self.shell.signed_in(user);
        if is_admin {
            self.admin = Some(AdminDashboard::mount(self.client.clone()).await);
        } else {
            self.voter = Some(VoterDashboard::mount(self.client.clone()).await);
        }
        self.show();
    }

    fn leave(&mut self) {
        self.voter = None;
        self.admin = None;
    }

    /// Drop dashboards once the session is gone.
    fn check_session(&mut self) {
        if self.shell.take_expiry_notice() {
            render::emit("Your session has expired. Please sign in again.");
        }
        if !self.shell.view().is_authenticated() && (self.voter.is_some() || self.admin.is_some())
        {
            self.leave();
            self.show();
        }
    }

    async fn handle<R>(&mut self, input: Input, lines: &mut Lines<R>) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin,
    {
        let view = self.shell.view();
        match (&view, input) {
            (_, Input::Empty | Input::Quit) => {}
            (_, Input::Help) => render::emit(help(&view)),

            (View::Login, Input::Switch) => {
                self.shell.show_register(true);
                self.show();
            }
            (View::Register, Input::Switch) => {
                self.shell.show_register(false);
                self.show();
            }
            (View::Login, Input::Login { username, password }) => {
                let password = SecretString::from(password);
                let user = login(&self.client, &username, &password).await?;
                self.enter(user).await;
            }
            (
                View::Register,
                Input::Register {
                    username,
                    email,
                    password,
                },
            ) => {
                let password = SecretString::from(password);
                let user = register(&self.client, &username, &email, &password).await?;
                render::emit("Account created.");
                self.enter(user).await;
            }

            (View::Voter(user) | View::Admin(user), Input::Whoami) => {
                render::emit(&render::user_line(user));
            }
            (View::Voter(_) | View::Admin(_), Input::Logout) => {
                self.shell.logout();
                self.leave();
                render::emit("Signed out.");
                self.show();
            }

            (View::Voter(_), Input::Refresh) => {
                let dashboard = self.voter().await;
                // A failed load is shown by the view
                let _ = dashboard.refresh().await;
                self.show();
            }
            (View::Voter(_), Input::Vote(id)) => {
                let dashboard = self.voter().await;
                let title = dashboard
                    .state()
                    .idea(id)
                    .map(|idea| idea.title.clone())
                    .ok_or(CliError::UnknownIdea(id))?;
                let outcome = dashboard.vote(id, &title).await?;
                render::emit(&render::vote_outcome(&outcome));
                self.show();
            }
            (View::Voter(_), Input::Submit { title, description }) => {
                let mut form = IdeaForm::new();
                form.set_title(title);
                form.set_description(description);
                let idea = form.submit(&self.client).await?;
                render::emit(&format!("#{} {}: {SUBMITTED_MESSAGE}", idea.id, idea.title));
            }

            (View::Admin(_), Input::Refresh) => {
                let dashboard = self.admin().await;
                let _ = dashboard.reload().await;
                self.show();
            }
            (View::Admin(_), Input::Approve(id)) => {
                let idea = self.admin().await.approve(id).await?;
                render::emit(&format!("Approved \"{}\".", idea.title));
                self.show();
            }
            (View::Admin(_), Input::Delete(id)) => {
                let title = admin::find(self.admin().await, id)
                    .map(|idea| idea.title.clone())
                    .ok_or(CliError::UnknownIdea(id))?;
                if confirm(lines, &format!("Delete \"{title}\"?")).await? {
                    self.admin().await.delete(id).await?;
                    render::emit(&format!("Deleted \"{title}\"."));
                    self.show();
                } else {
                    render::emit("Cancelled.");
                }
            }

            (_, input) => {
                debug!(?input, "Command not available in this view");
                render::emit("That command is not available here. Type `help`.");
            }
        }
        Ok(())
    }

    async fn voter(&mut self) -> &mut VoterDashboard<ApiClient> {
        let dashboard = match self.voter.take() {
            Some(dashboard) => dashboard,
            None => VoterDashboard::mount(self.client.clone()).await,
        };
        self.voter.insert(dashboard)
    }

    async fn admin(&mut self) -> &mut AdminDashboard<ApiClient> {
        let dashboard = match self.admin.take() {
            Some(dashboard) => dashboard,
            None => AdminDashboard::mount(self.client.clone()).await,
        };
        self.admin.insert(dashboard)
    }
}

/// Run the interactive shell until `quit` or end of input.
///
/// Configured credentials, if any, are used to sign in at start.
pub async fn run(ctx: Context) -> Result<(), CliError> {
    let mut repl = Repl::new(ctx.client.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Ok((username, password)) = ctx.credentials() {
        match login(&repl.client, username, password).await {
            Ok(user) => repl.enter(user).await,
            Err(error) => render::emit(&format!("Error: {error}")),
        }
    }
    if !repl.shell.view().is_authenticated() {
        repl.show();
    }

    loop {
        let prompt = repl.prompt();
        render::prompt(&prompt)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Ok(Input::Quit) => break,
            Ok(input) => match repl.handle(input, &mut lines).await {
                Ok(()) => {}
                Err(CliError::Io(error)) => return Err(CliError::Io(error)),
                Err(error) => render::emit(&format!("Error: {error}")),
            },
            Err(usage) => render::emit(&usage),
        }

        repl.check_session();
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_input("  "), Ok(Input::Empty));
        assert_eq!(parse_input("help"), Ok(Input::Help));
        assert_eq!(parse_input("exit"), Ok(Input::Quit));
        assert_eq!(parse_input("list"), Ok(Input::Refresh));
        assert_eq!(parse_input("vote 7"), Ok(Input::Vote(IdeaId::new(7))));
        assert_eq!(parse_input("delete 3"), Ok(Input::Delete(IdeaId::new(3))));
    }

    #[test]
    fn test_parse_login_and_register() {
        assert_eq!(
            parse_input("login alice wonderland"),
            Ok(Input::Login {
                username: "alice".to_string(),
                password: "wonderland".to_string(),
            })
        );
        assert_eq!(
            parse_input("register dora dora@example.com explorer"),
            Ok(Input::Register {
                username: "dora".to_string(),
                email: "dora@example.com".to_string(),
                password: "explorer".to_string(),
            })
        );
        assert!(parse_input("login alice").is_err());
    }

    #[test]
    fn test_parse_submit_splits_on_bar() {
        assert_eq!(
            parse_input("submit Bike racks | Covered racks | by the door"),
            Ok(Input::Submit {
                title: "Bike racks".to_string(),
                description: "Covered racks | by the door".to_string(),
            })
        );
        assert!(parse_input("submit no description").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_ids_and_unknown_commands() {
        assert!(parse_input("vote").is_err());
        assert!(parse_input("vote abc").is_err());
        assert!(parse_input("vote 0").is_err());
        assert!(parse_input("dance").is_err());
    }

    #[test]
    fn test_help_differs_per_view() {
        assert!(help(&View::Login).contains("login <username>"));
        assert!(help(&View::Register).contains("register <username>"));
    }
}
