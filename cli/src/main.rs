mod args;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use sproc_middleware::prelude::*;
use tracing::Level;

use crate::args::{Args, Command, ExecArgs};
use crate::logging::LogTarget;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let target = match LogTarget::open(args.log.as_deref()) {
        Ok(target) => target,
        Err(err) => {
            eprintln!("failed to open log file: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_ansi(target.wants_ansi())
        .with_writer(target)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let Some(conn_str) = args.connection_string.as_deref() else {
        tracing::error!("no connection string; pass --connection-string or set DbConnectionString");
        return ExitCode::FAILURE;
    };
    let info = match ConnectionInfo::new(conn_str) {
        Ok(info) => info,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match &args.command {
        Command::Exec(exec_args) => exec(&info, exec_args, &args.log_context).await,
        Command::List { qualified } => list(&info, *qualified).await,
    }
}

async fn exec(info: &ConnectionInfo, args: &ExecArgs, log_context: &str) -> ExitCode {
    let telemetry = TracingTelemetry;
    telemetry.send_heartbeat(
        &args.service_name,
        HeartbeatStatus::Running,
        &format!("executing {}", args.procedure),
    );

    let result = match (ProcedureName::new(args.procedure.as_str()), args.parameter_set()) {
        (Ok(procedure), Ok(params)) => {
            let executor = Executor::new(MssqlConnector)
                .with_options(ExecOptions::default().with_unknown_types(args.unknown_types))
                .with_event_log(Arc::new(telemetry), log_context);
            executor.execute(info, &procedure, &params).await
        }
        (Err(err), _) | (_, Err(err)) => ExecutionResult::failed(&err),
    };

    let status = if result.success() {
        HeartbeatStatus::Stopped
    } else {
        HeartbeatStatus::Failed
    };
    telemetry.send_heartbeat(&args.service_name, status, &format!("finished {}", args.procedure));

    let rendered = serde_json::to_string_pretty(&result).unwrap_or_else(|_| "{}".to_string());
    println!("{rendered}");
    if result.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn list(info: &ConnectionInfo, qualified: bool) -> ExitCode {
    let lister = ProcedureLister::new(MssqlConnector);
    let names = if qualified {
        lister.list_qualified(info).await
    } else {
        lister.list(info).await
    };

    match names {
        Ok(names) => {
            for name in names {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("listing stored procedures failed: {err}");
            ExitCode::FAILURE
        }
    }
}
