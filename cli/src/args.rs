use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::Value as JsonValue;
use sproc_middleware::{ParamType, ParameterSet, SprocError, UnknownTypePolicy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL Server stored procedures with typed parameters")]
pub(crate) struct Args {
    /// ADO.NET connection string for the target database.
    #[arg(long, global = true, env = "DbConnectionString", hide_env_values = true)]
    pub(crate) connection_string: Option<String>,
    /// Context string attached to every logged event.
    #[arg(long, global = true, env = "LOG_CONTEXT", default_value = "")]
    pub(crate) log_context: String,
    /// Also write log output to this file.
    #[arg(long, global = true)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Execute a stored procedure and print the result as JSON.
    Exec(ExecArgs),
    /// List the stored procedures of the target database.
    List {
        /// Prefix every name with its schema.
        #[arg(long)]
        qualified: bool,
    },
}

#[derive(ClapArgs, Debug)]
pub(crate) struct ExecArgs {
    /// Procedure to execute, e.g. `journalizing.sp_UpdatePurgeMarker`.
    pub(crate) procedure: String,
    /// Parameters as a JSON object of `name: [type, value]` entries.
    #[arg(long)]
    pub(crate) params_json: Option<String>,
    /// A single parameter; repeatable. Overrides the same name in `--params-json`.
    #[arg(long = "param", value_name = "NAME=TYPE:VALUE", value_parser = parse_param)]
    pub(crate) params: Vec<ParamArg>,
    #[arg(long, value_enum, default_value_t = UnknownTypePolicy::PassThrough)]
    pub(crate) unknown_types: UnknownTypePolicy,
    /// Service name reported in heartbeats.
    #[arg(long, default_value = "sproc")]
    pub(crate) service_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParamArg {
    pub(crate) name: String,
    pub(crate) declared: ParamType,
    pub(crate) raw: JsonValue,
}

impl ExecArgs {
    pub(crate) fn parameter_set(&self) -> Result<ParameterSet, SprocError> {
        let mut set = match &self.params_json {
            Some(text) => {
                let value: JsonValue =
                    serde_json::from_str(text).map_err(|e| SprocError::InvalidParameterShape {
                        name: "<parameters>".to_string(),
                        found: format!("not valid JSON ({e})"),
                    })?;
                ParameterSet::from_json(&value)?
            }
            None => ParameterSet::new(),
        };
        for param in &self.params {
            set.insert(param.name.clone(), param.declared.clone(), param.raw.clone());
        }
        Ok(set)
    }
}

fn parse_param(s: &str) -> Result<ParamArg, String> {
    let (name, rest) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE:VALUE, got `{s}`"))?;
    let (tag, value) = rest
        .split_once(':')
        .ok_or_else(|| format!("expected TYPE:VALUE after `{name}=`, got `{rest}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("parameter name must not be empty".to_string());
    }

    let declared = ParamType::from_tag(tag.trim());
    // json values are given as JSON text; anything else is bound from the literal string
    let raw = match declared {
        ParamType::Json => serde_json::from_str(value)
            .unwrap_or_else(|_| JsonValue::String(value.to_string())),
        _ => JsonValue::String(value.to_string()),
    };
    Ok(ParamArg {
        name: name.to_string(),
        declared,
        raw,
    })
}
