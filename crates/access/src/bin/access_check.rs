//! access-check
//!
//! Evaluates delegated permission checks against a JSON fixture.
//!
//! ```text
//! access-check --fixture world.json check --collection item --id i1 --user u1 --level write
//! access-check --fixture world.json load --collection file --id x1 --user u1 --fields name
//! access-check --fixture world.json search --collection item --query brain --user u1 --limit 10
//! ```

use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use helios_access::backends::memory::{Fixture, LoadedFixture};
use helios_access::types::{SearchRequest, SortDirective};
use helios_access::{
    AccessLevel, DelegatedCollection, LoadOptions, Model, ResourceType, SupportsAccessControl,
    User, init_logging,
};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "access-check")]
#[command(about = "Evaluate delegated access checks against a fixture", version)]
struct Cli {
    /// Path to the JSON fixture describing models, documents and users.
    #[arg(short, long, env = "ACCESS_FIXTURE")]
    fixture: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ACCESS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decide whether a user holds a level (and flags) on a document.
    Check {
        #[command(flatten)]
        target: Target,

        /// Required level.
        #[arg(long, default_value = "read")]
        level: AccessLevel,

        /// Required flags (comma-separated).
        #[arg(long, value_delimiter = ',')]
        flags: Vec<String>,
    },

    /// Load a document through its owner's permission check.
    Load {
        #[command(flatten)]
        target: Target,

        /// Required level.
        #[arg(long, default_value = "admin")]
        level: AccessLevel,

        /// Skip the owner check.
        #[arg(long)]
        force: bool,

        /// Fields to return besides `_id` (comma-separated).
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },

    /// Run a permission-filtered text or prefix search.
    Search {
        #[command(flatten)]
        collection: CollectionArgs,

        /// Search text.
        #[arg(short, long)]
        query: String,

        /// Match names by prefix instead of full text.
        #[arg(long)]
        prefix: bool,

        /// Acting user id; anonymous when omitted.
        #[arg(short, long)]
        user: Option<String>,

        /// Required level.
        #[arg(long, default_value = "read")]
        level: AccessLevel,

        /// Maximum number of results (0 is unbounded).
        #[arg(long, default_value = "0")]
        limit: usize,

        /// Number of granted results to skip.
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Sort fields, `-` prefix for descending (comma-separated).
        #[arg(long, value_delimiter = ',')]
        sort: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct CollectionArgs {
    /// Delegated collection name.
    #[arg(short, long)]
    collection: String,

    /// Plugin namespace of the collection.
    #[arg(long)]
    namespace: Option<String>,
}

#[derive(Debug, Args)]
struct Target {
    #[command(flatten)]
    collection: CollectionArgs,

    /// Document id.
    #[arg(long)]
    id: String,

    /// Acting user id; anonymous when omitted.
    #[arg(short, long)]
    user: Option<String>,
}

impl CollectionArgs {
    fn resource_type(&self) -> ResourceType {
        match &self.namespace {
            Some(namespace) => ResourceType::namespaced(&self.collection, namespace),
            None => ResourceType::new(&self.collection),
        }
    }

    fn resolve<'a>(
        &self,
        loaded: &'a LoadedFixture,
    ) -> anyhow::Result<&'a Arc<DelegatedCollection>> {
        let resource_type = self.resource_type();
        loaded
            .delegated_as(&resource_type)
            .ok_or_else(|| anyhow!("'{}' is not a delegated collection", resource_type))
    }
}

fn find_user<'a>(
    loaded: &'a LoadedFixture,
    id: Option<&str>,
) -> anyhow::Result<Option<&'a User>> {
    id.map(|id| loaded.user(id).ok_or_else(|| anyhow!("unknown user '{}'", id)))
        .transpose()
}

fn check(
    loaded: &LoadedFixture,
    target: &Target,
    level: AccessLevel,
    flags: &[String],
) -> anyhow::Result<Value> {
    let collection = target.collection.resolve(loaded)?;
    let user = find_user(loaded, target.user.as_deref())?;
    let doc = collection.load_required(&target.id, None)?;

    let level_granted = collection.has_access(&doc, user, level)?;
    let flags_granted = collection.has_access_flags(&doc, user, flags)?;
    let owner = collection.resolve_owner_type(&doc)?;
    debug!(owner = %owner, level_granted, flags_granted, "Evaluated check");

    Ok(json!({
        "collection": collection.resource_type(),
        "id": target.id,
        "user": target.user,
        "owner": {"type": owner.resource_type, "id": owner.id},
        "level": level.to_string(),
        "flags": flags,
        "granted": level_granted && flags_granted,
    }))
}

fn load(
    loaded: &LoadedFixture,
    target: &Target,
    level: AccessLevel,
    force: bool,
    fields: Option<Vec<String>>,
) -> anyhow::Result<Value> {
    let collection = target.collection.resolve(loaded)?;
    let user = find_user(loaded, target.user.as_deref())?;
    let options = LoadOptions {
        level,
        user,
        force,
        fields,
    };
    let doc = collection.load_with_access(&target.id, &options)?;
    Ok(doc.into_value())
}

fn run(command: Command, loaded: &LoadedFixture) -> anyhow::Result<Value> {
    match command {
        Command::Check {
            target,
            level,
            flags,
        } => check(loaded, &target, level, &flags),
        Command::Load {
            target,
            level,
            force,
            fields,
        } => load(loaded, &target, level, force, fields),
        Command::Search {
            collection,
            query,
            prefix,
            user,
            level,
            limit,
            offset,
            sort,
        } => {
            let delegated = collection.resolve(loaded)?;
            let mut request = SearchRequest::new(query)
                .with_level(level)
                .with_limit(limit)
                .with_offset(offset);
            if let Some(user) = find_user(loaded, user.as_deref())? {
                request = request.with_user(user);
            }
            for field in &sort {
                request = request.with_sort(SortDirective::parse(field));
            }

            let results = if prefix {
                delegated.prefix_search(&request)?
            } else {
                delegated.text_search(&request)?
            };
            let docs = results
                .map(|doc| doc.map(|d| d.into_value()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(docs))
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let fixture = Fixture::from_path(&cli.fixture)
        .with_context(|| format!("failed to read fixture {}", cli.fixture))?;

    if let Err(errors) = fixture.access_config().validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let loaded = fixture.build().context("invalid fixture")?;
    info!(fixture = %cli.fixture, command = ?cli.command, "Running access check");

    let output = run(cli.command, &loaded)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
