//! Mixcloud CLI - Command-line access to the Mixcloud API
//!
//! This binary provides commands for:
//! - get, me, discover: fetch single resources
//! - popular, hot, new, search, connection: fetch resource pages
//! - action: follow, favorite, repost and listen-later (and their undos)
//! - embed, oembed: embedding information
//! - upload, edit: cloudcast uploads
//! - authorize-url, access-token: OAuth authorization

mod config;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::CliConfig;
use indicatif::{ProgressBar, ProgressStyle};
use mixcloud_client::{
    DisplayOptions, EmbedFormat, GetOptions, MixcloudOAuth, MixcloudOAuthSync, MixcloudSync,
    SearchType, TargetedAction, UploadParams,
};
use mixcloud_model::{DateTimeLike, Pagination, Wrapped};
use serde_json::{Map, Value};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mixcloud")]
#[command(about = "Mixcloud API command-line client")]
#[command(version)]
struct Cli {
    /// API root URL
    #[arg(long, global = true)]
    api_root: Option<String>,
    /// OAuth access token for personal commands
    #[arg(long, global = true, env = "MIXCLOUD_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Fail on API error payloads instead of printing them
    #[arg(long, global = true)]
    raise_exceptions: bool,
    /// Show a progress spinner while waiting on the API
    #[arg(long, global = true)]
    progress: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a resource by key
    ///
    /// Examples:
    ///   mixcloud get /spartacus/
    ///   mixcloud get spartacus/party-time/ --no-connections
    Get {
        /// Resource key, or an absolute URL with --absolute
        key: String,
        /// Treat the key as an absolute URL
        #[arg(long)]
        absolute: bool,
        /// Do not read connections from the response metadata
        #[arg(long)]
        no_connections: bool,
    },
    /// Fetch the user authorized by the access token
    Me,
    /// Fetch information about a tag
    Discover {
        /// Tag name
        tag: String,
    },
    /// Fetch popular cloudcasts
    Popular {
        #[command(flatten)]
        pagination: PaginationArgs,
    },
    /// Fetch hot cloudcasts
    Hot {
        #[command(flatten)]
        pagination: PaginationArgs,
    },
    /// Fetch new cloudcasts
    New {
        #[command(flatten)]
        pagination: PaginationArgs,
    },
    /// Search resources
    Search {
        /// Search terms
        query: String,
        /// Kind of resource to search
        #[arg(long = "type", value_enum, default_value_t = SearchArg::Cloudcast)]
        search_type: SearchArg,
        #[command(flatten)]
        pagination: PaginationArgs,
    },
    /// Fetch one page of a resource connection
    ///
    /// Examples:
    ///   mixcloud connection /spartacus/ followers --page 2
    Connection {
        /// Resource key
        key: String,
        /// Connection name (hyphens replaced by underscores)
        name: String,
        #[command(flatten)]
        pagination: PaginationArgs,
    },
    /// Perform a social action on a resource
    Action {
        /// Action to perform
        #[arg(value_enum)]
        action: ActionArg,
        /// Resource key
        key: String,
    },
    /// Fetch embed data for a cloudcast
    Embed {
        /// Cloudcast key
        key: String,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Fetch oEmbed data for a resource
    Oembed {
        /// Resource key
        key: String,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Upload a cloudcast
    Upload {
        /// mp3 file to upload
        mp3: PathBuf,
        /// Cloudcast name
        #[arg(long)]
        name: String,
        #[command(flatten)]
        upload: UploadArgs,
    },
    /// Edit an uploaded cloudcast
    Edit {
        /// Cloudcast key; a bare slug refers to one of your own cloudcasts
        key: String,
        /// New cloudcast name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        upload: UploadArgs,
    },
    /// Print the OAuth authorization URL
    AuthorizeUrl {
        #[command(flatten)]
        oauth: OAuthArgs,
    },
    /// Trade an OAuth code for an access token
    AccessToken {
        /// Code received on the redirect URI
        code: String,
        #[command(flatten)]
        oauth: OAuthArgs,
    },
}

#[derive(Args, Debug, Default)]
struct PaginationArgs {
    /// Number of resources to skip
    #[arg(long)]
    offset: Option<u64>,
    /// Maximum number of resources
    #[arg(long)]
    limit: Option<u64>,
    /// Only resources after this time (timestamp or datetime)
    #[arg(long)]
    since: Option<String>,
    /// Only resources before this time (timestamp or datetime)
    #[arg(long)]
    until: Option<String>,
    /// Zero-based page number
    #[arg(long)]
    page: Option<u64>,
    /// Page size used with --page
    #[arg(long)]
    per_page: Option<u64>,
}

impl PaginationArgs {
    fn to_pagination(&self) -> Pagination {
        Pagination {
            offset: self.offset,
            limit: self.limit,
            since: self.since.as_deref().map(parse_time),
            until: self.until.as_deref().map(parse_time),
            page: self.page,
            per_page: self.per_page,
        }
    }
}

fn parse_time(text: &str) -> DateTimeLike {
    match text.parse::<i64>() {
        Ok(timestamp) => DateTimeLike::Timestamp(timestamp),
        Err(_) => DateTimeLike::from(text),
    }
}

#[derive(Args, Debug, Default)]
struct DisplayArgs {
    /// Response format
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    format: FormatArg,
    /// Widget width
    #[arg(long)]
    width: Option<u32>,
    /// Widget height
    #[arg(long)]
    height: Option<u32>,
    /// Widget color
    #[arg(long)]
    color: Option<String>,
}

impl DisplayArgs {
    fn to_options(&self) -> DisplayOptions {
        DisplayOptions {
            format: self.format.into(),
            width: self.width,
            height: self.height,
            color: self.color.clone(),
        }
    }
}

#[derive(Args, Debug, Default)]
struct UploadArgs {
    /// Cover picture file
    #[arg(long)]
    picture: Option<PathBuf>,
    /// Description text
    #[arg(long)]
    description: Option<String>,
    /// Tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Publishing time (timestamp or datetime)
    #[arg(long)]
    publish_date: Option<String>,
    /// Disable comments
    #[arg(long)]
    disable_comments: bool,
    /// Hide play statistics
    #[arg(long)]
    hide_stats: bool,
    /// Keep out of listings
    #[arg(long)]
    unlisted: bool,
    /// Track section as a JSON object, e.g. '{"artist": "A", "song": "S"}' (repeatable)
    #[arg(long = "section", value_parser = parse_section)]
    sections: Vec<Map<String, Value>>,
}

impl UploadArgs {
    fn to_params(&self) -> UploadParams {
        UploadParams {
            picture: self.picture.clone(),
            description: self.description.clone(),
            tags: (!self.tags.is_empty()).then(|| self.tags.clone()),
            publish_date: self.publish_date.as_deref().map(parse_time),
            disable_comments: self.disable_comments,
            hide_stats: self.hide_stats,
            unlisted: self.unlisted,
            sections: (!self.sections.is_empty()).then(|| self.sections.clone()),
        }
    }
}

fn parse_section(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(text) {
        Ok(Value::Object(section)) => Ok(section),
        Ok(_) => Err("section must be a JSON object".to_string()),
        Err(err) => Err(format!("invalid section JSON: {}", err)),
    }
}

#[derive(Args, Debug, Default)]
struct OAuthArgs {
    /// Client ID issued by Mixcloud
    #[arg(long)]
    client_id: Option<String>,
    /// Client secret issued by Mixcloud
    #[arg(long)]
    client_secret: Option<String>,
    /// Redirect URI registered for the application
    #[arg(long)]
    redirect_uri: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum SearchArg {
    Cloudcast,
    User,
    Tag,
}

impl From<SearchArg> for SearchType {
    fn from(arg: SearchArg) -> Self {
        match arg {
            SearchArg::Cloudcast => SearchType::Cloudcast,
            SearchArg::User => SearchType::User,
            SearchArg::Tag => SearchType::Tag,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum FormatArg {
    #[default]
    Json,
    Html,
}

impl From<FormatArg> for EmbedFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => EmbedFormat::Json,
            FormatArg::Html => EmbedFormat::Html,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ActionArg {
    Follow,
    Unfollow,
    Favorite,
    Unfavorite,
    Repost,
    Unrepost,
    ListenLater,
    UnlistenLater,
}

impl From<ActionArg> for TargetedAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Follow => TargetedAction::Follow,
            ActionArg::Unfollow => TargetedAction::Unfollow,
            ActionArg::Favorite => TargetedAction::Favorite,
            ActionArg::Unfavorite => TargetedAction::Unfavorite,
            ActionArg::Repost => TargetedAction::Repost,
            ActionArg::Unrepost => TargetedAction::Unrepost,
            ActionArg::ListenLater => TargetedAction::ListenLater,
            ActionArg::UnlistenLater => TargetedAction::UnlistenLater,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    tracing::debug!(api_root = %config.client.api_root, "configuration resolved");

    match &cli.command {
        Commands::AuthorizeUrl { oauth } => {
            let oauth = build_oauth(&config, oauth);
            println!("{}", oauth.authorization_url()?);
        }
        Commands::AccessToken { code, oauth } => {
            let client = MixcloudSync::new(config.client.clone())?;
            let oauth = MixcloudOAuthSync::new(
                build_oauth(&config, oauth).with_client(client.client().clone()),
            )?;
            let token = with_spinner(cli.progress, "Exchanging code", || {
                oauth.access_token(code)
            })?;
            print_json(&serde_json::json!({ "access_token": token }))?;
        }
        command => {
            let client = MixcloudSync::new(config.client.clone())?;
            let result = with_spinner(cli.progress, "Waiting for Mixcloud", || {
                run_command(&client, command)
            })?;
            print_json(&result.to_value())?;
        }
    }

    Ok(())
}

fn run_command(client: &MixcloudSync, command: &Commands) -> Result<Wrapped, Box<dyn Error>> {
    let result = match command {
        Commands::Get {
            key,
            absolute,
            no_connections,
        } => {
            let options = GetOptions {
                relative: !absolute,
                create_connections: !no_connections,
            };
            client.get(key, options, &[])?
        }
        Commands::Me => client.me()?,
        Commands::Discover { tag } => client.discover(tag)?,
        Commands::Popular { pagination } => client.popular(&pagination.to_pagination())?,
        Commands::Hot { pagination } => client.hot(&pagination.to_pagination())?,
        Commands::New { pagination } => client.new_cloudcasts(&pagination.to_pagination())?,
        Commands::Search {
            query,
            search_type,
            pagination,
        } => client.search(query, (*search_type).into(), &pagination.to_pagination())?,
        Commands::Connection {
            key,
            name,
            pagination,
        } => {
            let resource = client.get(key, GetOptions::default(), &[])?;
            let Some(entity) = resource.as_entity() else {
                return Err(format!("{} is not a resource: {}", key, resource).into());
            };
            client.connection(entity, name, &pagination.to_pagination())?
        }
        Commands::Action { action, key } => {
            let action = TargetedAction::from(*action);
            client.block_on(action.run(client.client(), key, &Value::Null))?
        }
        Commands::Embed { key, display } => {
            let options = display.to_options();
            match options.format {
                EmbedFormat::Json => client.embed_json(key, &options)?,
                EmbedFormat::Html => client.embed_html(key, &options)?,
            }
        }
        Commands::Oembed { key, display } => client.oembed(key, &display.to_options())?,
        Commands::Upload { mp3, name, upload } => {
            client.upload(mp3, name, &upload.to_params())?
        }
        Commands::Edit { key, name, upload } => {
            client.edit(key, &upload.to_params(), name.as_deref())?
        }
        Commands::AuthorizeUrl { .. } | Commands::AccessToken { .. } => {
            return Err("OAuth commands do not call the API client".into());
        }
    };
    Ok(result)
}

/// Layer the config file, the environment and command-line flags.
fn resolve_config(cli: &Cli) -> Result<CliConfig, Box<dyn Error>> {
    let mut config = CliConfig::load_or_default(cli.config.as_deref().map(Path::new))?;
    config.client = config
        .client
        .with_env_overrides(|name| std::env::var(name).ok());

    if let Some(api_root) = &cli.api_root {
        config.client.api_root = api_root.clone();
    }
    if let Some(token) = &cli.access_token {
        config.client.access_token = Some(token.clone());
    }
    if cli.raise_exceptions {
        config.client.raise_exceptions = true;
    }
    Ok(config)
}

fn build_oauth(config: &CliConfig, args: &OAuthArgs) -> MixcloudOAuth {
    let mut oauth = MixcloudOAuth::new().with_oauth_root(config.client.oauth_root.clone());
    oauth.client_id = args.client_id.clone().or_else(|| config.oauth.client_id.clone());
    oauth.client_secret = args
        .client_secret
        .clone()
        .or_else(|| config.oauth.client_secret.clone());
    oauth.redirect_uri = args
        .redirect_uri
        .clone()
        .or_else(|| config.oauth.redirect_uri.clone());
    oauth
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "warn,mixcloud_client=debug,mixcloud_model=debug",
        _ => "warn,mixcloud_client=trace,mixcloud_model=trace,mixcloud=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn with_spinner<T>(enabled: bool, message: &str, work: impl FnOnce() -> T) -> T {
    let spinner = enabled.then(|| create_spinner(message));
    let result = work();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    result
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_json(value: &Value) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn times_accept_timestamps_and_text() {
        assert_eq!(parse_time("1700000000"), DateTimeLike::Timestamp(1_700_000_000));
        assert_eq!(
            parse_time("2020-01-01"),
            DateTimeLike::Text("2020-01-01".to_string())
        );
    }

    #[test]
    fn pagination_flags_map_directly() {
        let cli = Cli::parse_from(["mixcloud", "popular", "--page", "3", "--per-page", "10"]);
        let Commands::Popular { pagination } = cli.command else {
            panic!("expected popular");
        };
        let params = pagination.to_pagination().to_params().unwrap();
        assert_eq!(
            params,
            vec![
                ("offset".to_string(), "30".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn upload_flags_become_params() {
        let cli = Cli::parse_from([
            "mixcloud",
            "upload",
            "mix.mp3",
            "--name",
            "Mix",
            "--tag",
            "house",
            "--tag",
            "techno",
            "--section",
            r#"{"artist": "A", "song": "S"}"#,
            "--unlisted",
        ]);
        let Commands::Upload { upload, .. } = cli.command else {
            panic!("expected upload");
        };
        let params = upload.to_params();
        assert_eq!(params.tags, Some(vec!["house".to_string(), "techno".to_string()]));
        assert_eq!(params.sections.as_ref().map(Vec::len), Some(1));
        assert!(params.unlisted);
        assert_eq!(params.description, None);
    }

    #[test]
    fn sections_must_be_objects() {
        assert!(parse_section("[1, 2]").is_err());
        assert!(parse_section("{").is_err());
        assert!(parse_section(r#"{"artist": "A"}"#).is_ok());
    }

    #[test]
    fn action_names_are_kebab_case() {
        let cli = Cli::parse_from(["mixcloud", "action", "unlisten-later", "/bob/mix/"]);
        let Commands::Action { action, .. } = cli.command else {
            panic!("expected action");
        };
        assert_eq!(TargetedAction::from(action), TargetedAction::UnlistenLater);
    }
}
