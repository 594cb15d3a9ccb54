//! Command-line front end for parselink.
//!
//! Argument parsing and command execution live here so they can be driven
//! against a mock transport; `main.rs` only wires logging and the HTTP
//! transport.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use parselink_model::{
    Attributes, Collection, Entity, ID_ATTRIBUTE, PASSWORD_ATTRIBUTE, SESSION_TOKEN_ATTRIBUTE,
    SessionEntity, SyncProtocol, USERNAME_ATTRIBUTE,
};
use parselink_sync::{
    ClassSync, Lifecycle, ParseConfig, RequestBody, RequestDescriptor, SessionSync, SyncOptions,
    SyncStrategy, SyncTarget, Transport, Verb,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "parselink")]
#[command(about = "Talk to a Parse-style document store from the command line")]
pub struct Args {
    /// Server URL including the mount path, e.g. http://localhost:1337/parse
    #[arg(long)]
    pub server: Option<String>,

    /// Application id sent as X-Parse-Application-Id
    #[arg(long)]
    pub app_id: Option<String>,

    /// REST API key sent as X-Parse-REST-API-Key
    #[arg(long)]
    pub rest_key: Option<String>,

    /// JSON config file with server_url, app_id, rest_api_key, timeout_secs
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Session token for me/logout
    #[arg(long)]
    pub session_token: Option<String>,

    /// Print the request instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new user
    Signup {
        username: String,
        password: String,
        /// Extra profile fields as a JSON object
        #[arg(long)]
        data: Option<String>,
    },
    /// Log in and print the session
    Login { username: String, password: String },
    /// Show the current user
    Me,
    /// End the current session
    Logout,
    /// List the objects of a class
    Fetch {
        class: String,
        /// Filter as a JSON object
        #[arg(long = "where")]
        filter: Option<String>,
    },
    /// Show one object
    Get { class: String, id: String },
    /// Create an object from a JSON object
    Create { class: String, data: String },
    /// Delete one object
    Delete { class: String, id: String },
}

impl Command {
    /// The subcommand name. Used for logging instead of `Debug`, which
    /// would print credentials.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Signup { .. } => "signup",
            Command::Login { .. } => "login",
            Command::Me => "me",
            Command::Logout => "logout",
            Command::Fetch { .. } => "fetch",
            Command::Get { .. } => "get",
            Command::Create { .. } => "create",
            Command::Delete { .. } => "delete",
        }
    }
}

/// Builds the configuration: the config file if given, the environment
/// otherwise, with command-line flags taking precedence over both.
pub fn resolve_config(args: &Args, lookup: impl Fn(&str) -> Option<String>) -> Result<ParseConfig> {
    let base = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<ParseConfig>(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => ParseConfig::from_lookup(lookup).context("invalid environment configuration")?,
    };

    let server = args.server.as_deref().unwrap_or(base.server_url());
    let app_id = args.app_id.as_deref().unwrap_or(base.app_id());
    let mut config = ParseConfig::new(server, app_id)?.with_timeout(base.timeout());
    if let Some(key) = args.rest_key.as_deref().or(base.rest_api_key()) {
        config = config.with_rest_api_key(key);
    }
    Ok(config)
}

/// Runs the parsed command and returns what should be printed.
pub async fn run(
    args: &Args,
    config: Arc<ParseConfig>,
    transport: Arc<dyn Transport>,
) -> Result<Value> {
    debug!(command = args.command.name(), dry_run = args.dry_run, "running command");
    match &args.command {
        Command::Signup {
            username,
            password,
            data,
        } => {
            let mut attributes = match data {
                Some(raw) => parse_object(raw)?,
                None => Attributes::new(),
            };
            attributes.insert(USERNAME_ATTRIBUTE.into(), username.as_str().into());
            attributes.insert(PASSWORD_ATTRIBUTE.into(), password.as_str().into());
            let user = SessionEntity::with_attributes(attributes);
            let sync = SessionSync::new(config, transport);
            if args.dry_run {
                return Ok(describe(&sync.signup_request(&user)?));
            }
            sync.signup(&user, SyncOptions::new())?
                .await
                .context("signup failed")?;
            Ok(without_password(&user))
        }
        Command::Login { username, password } => {
            let mut attributes = Attributes::new();
            attributes.insert(USERNAME_ATTRIBUTE.into(), username.as_str().into());
            attributes.insert(PASSWORD_ATTRIBUTE.into(), password.as_str().into());
            let user = SessionEntity::with_attributes(attributes);
            let sync = SessionSync::new(config, transport);
            if args.dry_run {
                return Ok(describe(&sync.login_request(&user)?));
            }
            sync.login(&user, SyncOptions::new())?
                .await
                .context("login failed")?;
            Ok(without_password(&user))
        }
        Command::Me => {
            let user = session_user(args);
            let sync = SessionSync::new(config, transport);
            if args.dry_run {
                return Ok(describe(&sync.retrieve_request(&user)?));
            }
            sync.retrieve(&user, SyncOptions::new())?
                .await
                .context("failed to retrieve current user")?;
            Ok(Value::Object(user.to_profile_json()))
        }
        Command::Logout => {
            let user = session_user(args);
            let sync = SessionSync::new(config, transport);
            if args.dry_run {
                return Ok(describe(&sync.logout_request(&user)?));
            }
            sync.logout(&user, SyncOptions::new())?
                .await
                .context("logout failed")?;
            Ok(json!({"loggedOut": true}))
        }
        Command::Fetch { class, filter } => {
            let sync = ClassSync::new(config, transport);
            let collection = Collection::of_class(class.as_str());
            let mut options = SyncOptions::new();
            if let Some(raw) = filter {
                options = options.with_query(Value::Object(parse_object(raw)?));
            }
            if args.dry_run {
                let request = sync.request(Verb::Read, SyncTarget::Collection(&collection), &options)?;
                return Ok(describe(&request));
            }
            Lifecycle::new(Arc::new(sync))
                .fetch_collection(&collection, options)?
                .await
                .with_context(|| format!("failed to fetch {class}"))
        }
        Command::Get { class, id } => {
            let entity = identified(class, id);
            let sync = ClassSync::new(config, transport);
            if args.dry_run {
                return Ok(describe(&sync.request(Verb::Read, (&entity).into(), &SyncOptions::new())?));
            }
            Lifecycle::new(Arc::new(sync))
                .fetch(&entity, SyncOptions::new())?
                .await
                .with_context(|| format!("failed to fetch {class}/{id}"))?;
            Ok(Value::Object(entity.attributes()))
        }
        Command::Create { class, data } => {
            let entity = Entity::with_attributes(SyncProtocol::class(class.as_str()), parse_object(data)?);
            if !entity.is_new() {
                bail!("new objects must not carry an {ID_ATTRIBUTE}");
            }
            let sync = ClassSync::new(config, transport);
            if args.dry_run {
                return Ok(describe(&sync.request(Verb::Create, (&entity).into(), &SyncOptions::new())?));
            }
            Lifecycle::new(Arc::new(sync))
                .save(&entity, SyncOptions::new())?
                .await
                .with_context(|| format!("failed to create {class}"))?;
            Ok(Value::Object(entity.attributes()))
        }
        Command::Delete { class, id } => {
            let entity = identified(class, id);
            let sync = ClassSync::new(config, transport);
            if args.dry_run {
                return Ok(describe(&sync.request(Verb::Delete, (&entity).into(), &SyncOptions::new())?));
            }
            Lifecycle::new(Arc::new(sync))
                .destroy(&entity, SyncOptions::new())?
                .await
                .with_context(|| format!("failed to delete {class}/{id}"))?;
            Ok(json!({"deleted": id}))
        }
    }
}

/// A printable summary of a request. Header values and form values are
/// left out; they may hold credentials.
pub fn describe(request: &RequestDescriptor) -> Value {
    let headers: Vec<&str> = request.headers.iter().map(|(name, _)| name.as_str()).collect();
    let body = match &request.body {
        Some(RequestBody::Json(Value::Object(map))) => {
            let mut map = map.clone();
            map.remove(PASSWORD_ATTRIBUTE);
            Value::Object(map)
        }
        Some(RequestBody::Json(value)) => value.clone(),
        Some(RequestBody::Query(query)) => Value::String(query.clone()),
        Some(RequestBody::Form(pairs)) => pairs
            .iter()
            .map(|(name, _)| Value::String(name.clone()))
            .collect(),
        None => Value::Null,
    };
    json!({
        "method": request.method.as_str(),
        "url": request.url,
        "headers": headers,
        "contentType": request.content_type.as_str(),
        "body": body,
    })
}

fn parse_object(raw: &str) -> Result<Attributes> {
    match serde_json::from_str(raw).context("expected a JSON object")? {
        Value::Object(map) => Ok(map),
        other => bail!("expected a JSON object, got {other}"),
    }
}

fn session_user(args: &Args) -> SessionEntity {
    let mut attributes = Attributes::new();
    if let Some(token) = &args.session_token {
        attributes.insert(SESSION_TOKEN_ATTRIBUTE.into(), token.as_str().into());
    }
    SessionEntity::with_attributes(attributes)
}

fn identified(class: &str, id: &str) -> Entity {
    let mut attributes = Attributes::new();
    attributes.insert(ID_ATTRIBUTE.into(), id.into());
    Entity::with_attributes(SyncProtocol::class(class), attributes)
}

/// The user's attributes for display. Keeps the session token, which the
/// caller needs for `me` and `logout`.
fn without_password(user: &SessionEntity) -> Value {
    let mut attributes = user.attributes();
    attributes.remove(PASSWORD_ATTRIBUTE);
    Value::Object(attributes)
}
