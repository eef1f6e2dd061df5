use clap::{Args, Subcommand};

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Store the connection for an org under a name
    ///
    /// Credentials come from SF_* variables, a .env file, flags, or prompts.
    /// An org is reached either through the OAuth username-password flow or
    /// with an existing session (instance URL plus access token).
    Setup {
        /// Name for this org (e.g., "source", "target")
        #[arg(short, long)]
        name: Option<String>,
        /// Login URL or My Domain (login.salesforce.com, test.salesforce.com, acme--uat.sandbox)
        #[arg(long)]
        login_url: Option<String>,
        /// Username
        #[arg(long)]
        username: Option<String>,
        /// Password, with the security token appended if the org requires one
        #[arg(long)]
        password: Option<String>,
        /// Connected App consumer key
        #[arg(long)]
        client_id: Option<String>,
        /// Connected App consumer secret
        #[arg(long)]
        client_secret: Option<String>,
        /// Instance URL of an existing session
        #[arg(long, requires = "access_token")]
        instance_url: Option<String>,
        /// Access token of an existing session
        #[arg(long, requires = "instance_url")]
        access_token: Option<String>,
        /// Import credentials from SF_* environment variables
        #[arg(long, conflicts_with = "from_env_file")]
        from_env: bool,
        /// Import credentials from specified .env file
        #[arg(long)]
        from_env_file: Option<String>,
    },
    /// Make an org the default target for load and dump
    Select {
        /// Environment name to select
        name: Option<String>,
        /// Obtain a session to confirm the org is reachable
        #[arg(long)]
        check: bool,
    },
    /// Remove an org, or only its stored access token
    Remove {
        /// Environment name to remove
        name: String,
        /// Force removal without confirmation
        #[arg(short, long)]
        force: bool,
        /// Forget the stored access token and keep the login credentials
        #[arg(long)]
        token_only: bool,
    },
    /// Show configured orgs and test the current one
    Status {
        /// Environment to inspect instead of the current one
        #[arg(short, long)]
        name: Option<String>,
        /// Skip the authentication test
        #[arg(long)]
        offline: bool,
    },
}
