use std::env;
use std::process::ExitCode;

use flowtrack::config::AppConfig;
use flowtrack::demo::{consume, produce, FLOW_NAME};
use flowtrack::errors::AppError;
use flowtrack::{connect, FinishResult};
use log::error;

const USAGE: &str = "uso: flowtrack <produce [ORDER_ID] | consume ORDER_ID | demo>";

fn new_order_id() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 100_000;
    format!("ORDER-{n}")
}

fn print_result(order_id: &str, result: Option<&FinishResult>) -> Result<(), AppError> {
    match result {
        None => println!("Flow '{FLOW_NAME}' [{order_id}] omitido: nada que procesar."),
        Some(r) => {
            if r.success {
                println!("Flow '{FLOW_NAME}' [{order_id}] validado OK ({:?})", r.execution_time);
            } else {
                println!("Flow '{FLOW_NAME}' [{order_id}] FALLÓ con {} discrepancias", r.error_count);
            }
            println!("{}", serde_json::to_string_pretty(r)?);
        }
    }
    Ok(())
}

async fn run(args: &[String]) -> Result<bool, AppError> {
    let cmd = args.first().map(String::as_str);
    if !matches!(cmd, Some("produce" | "consume" | "demo")) {
        return Err(AppError::Config(USAGE.to_string()));
    }
    let cfg = AppConfig::from_env()?;
    match cmd {
        Some("produce") => {
            let order_id = args.get(1).cloned().unwrap_or_else(new_order_id);
            let client = connect(&cfg).await?;
            let flow = produce(&client, &order_id).await?;
            println!("Flow '{FLOW_NAME}' [{order_id}] listo para el consumidor (status {}).",
                     flow.status());
            client.close();
            Ok(true)
        }
        Some("consume") => {
            let order_id = args.get(1).ok_or_else(|| AppError::Config(USAGE.to_string()))?;
            let client = connect(&cfg).await?;
            let result = consume(&client, order_id, None).await?;
            print_result(order_id, result.as_ref())?;
            client.close();
            Ok(result.map_or(true, |r| r.success))
        }
        Some("demo") => {
            let order_id = new_order_id();
            let client = connect(&cfg).await?;
            produce(&client, &order_id).await?;
            let result = consume(&client, &order_id, None).await?;
            print_result(&order_id, result.as_ref())?;
            client.close();
            Ok(result.map_or(true, |r| r.success))
        }
        _ => Err(AppError::Config(USAGE.to_string())),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}
