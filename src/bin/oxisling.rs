// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxisling::{
    config::ResolverConfig,
    path::default_config_path,
    request::{split_request_path, ScriptRequest},
    resolver::{Candidacy, ServletResolver, DEFAULT_SERVLET_NAME},
    resource::{Resource, ResourceTreeReader},
    tree::MemoryTree,
    LocationIterator,
};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "oxisling [options] --tree <content_file> <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to resolver configuration file.
    #[arg(short, long, value_name = "config_file")]
    pub config: Option<PathBuf>,

    /// Path to content file describing the resource tree.
    #[arg(short, long, required = true, value_name = "content_file")]
    pub tree: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config = match self.config {
            Some(path) => ResolverConfig::load(path)?,
            None => ResolverConfig::load(default_config_path()?)?,
        };
        let resolver = ServletResolver::new(config, MemoryTree::load(self.tree)?);

        match self.command {
            Command::Locations(opts) => run_locations(&resolver, opts),
            Command::Resolve(opts) => run_resolve(&resolver, opts),
            Command::Find(opts) => run_find(&resolver, opts),
            Command::Error(opts) => run_error(&resolver, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List locations searched for scripts of resource type.
    #[command(override_usage = "oxisling locations [options] <resource_type>")]
    Locations(LocationsOptions),

    /// List script candidates for request path, best first.
    #[command(override_usage = "oxisling resolve [options] <request_path>")]
    Resolve(ResolveOptions),

    /// Find script by name.
    #[command(override_usage = "oxisling find [options] <script_name>")]
    Find(FindOptions),

    /// Resolve error handler for resource.
    #[command(override_usage = "oxisling error [options] --resource <path> <name>...")]
    Error(ErrorOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct LocationsOptions {
    /// Resource type to list locations of.
    #[arg(required = true, value_name = "resource_type")]
    pub resource_type: String,

    /// Super type overriding the one found in the resource tree.
    #[arg(short, long, value_name = "resource_type")]
    pub super_type: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ResolveOptions {
    /// Request path, e.g., "/content/page.print.html".
    #[arg(required = true, value_name = "request_path")]
    pub request_path: String,

    /// Request method.
    #[arg(short, long, default_value = "GET", value_name = "method")]
    pub method: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct FindOptions {
    /// Name of script, either absolute or relative to search path.
    #[arg(required = true, value_name = "script_name")]
    pub script_name: String,

    /// List every script carrying name instead of the first found.
    #[arg(short, long)]
    pub all: bool,

    /// Path of resource whose resource type locations are searched.
    #[arg(short, long, requires = "all", value_name = "path")]
    pub resource: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ErrorOptions {
    /// Status codes or error names, most specific first.
    #[arg(required = true, value_name = "name")]
    pub names: Vec<String>,

    /// Path of resource the error occurred on.
    #[arg(short, long, required = true, value_name = "path")]
    pub resource: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn lookup_resource(resolver: &ServletResolver, path: &str) -> Resource {
    resolver
        .reader()
        .get_resource(path)
        .unwrap_or_else(|| Resource::non_existing(path))
}

fn run_locations(resolver: &ServletResolver, opts: LocationsOptions) -> Result<()> {
    let locations = LocationIterator::new(
        opts.resource_type,
        opts.super_type.as_deref(),
        DEFAULT_SERVLET_NAME,
        &resolver.config().search_paths,
        resolver.reader(),
    );

    for location in locations {
        println!("{location}");
    }

    Ok(())
}

fn run_resolve(resolver: &ServletResolver, opts: ResolveOptions) -> Result<()> {
    let (resource, path_info) = split_request_path(resolver.reader(), &opts.request_path);
    let request = ScriptRequest::from_path_info(opts.method, &path_info);
    info!(
        "resolve {} with selectors {:?} and extension {:?}",
        resource.path(),
        request.selectors,
        request.extension
    );

    let candidates = resolver.candidates(&request, &resource);
    if candidates.is_empty() {
        return Err(anyhow!("no script can render {:?}", opts.request_path));
    }

    for candidate in candidates {
        println!("{}", candidate.path());
    }

    Ok(())
}

fn run_find(resolver: &ServletResolver, opts: FindOptions) -> Result<()> {
    if opts.all {
        let resource = opts
            .resource
            .as_deref()
            .map(|path| lookup_resource(resolver, path));
        for script in resolver.named_candidates(&opts.script_name, resource.as_ref()) {
            println!("{}", script.path());
        }

        return Ok(());
    }

    let script = resolver
        .find_script(&opts.script_name)
        .ok_or_else(|| anyhow!("no script {:?} found in search path", opts.script_name))?;
    println!("{}", script.path());

    Ok(())
}

fn run_error(resolver: &ServletResolver, opts: ErrorOptions) -> Result<()> {
    let resource = lookup_resource(resolver, &opts.resource);
    let handler = resolver
        .resolve_error_handler(&opts.names, &resource, |_| Candidacy::Accepts)
        .ok_or_else(|| anyhow!("no error handler found for {:?}", opts.resource))?;
    println!("{}", handler.path());

    Ok(())
}
