//! `connect` contra Postgres (requiere DATABASE_URL).

use flowtrack::config::AppConfig;
use flowtrack::connect;
use flowtrack::demo::{consume, produce};

#[tokio::test(flavor = "multi_thread")]
async fn connect_runs_demo_end_to_end() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    let mut cfg = AppConfig::from_env().expect("config");
    cfg.flow.production = false;
    cfg.flow.max_executions = 0;
    let client = connect(&cfg).await.expect("connect");

    let order_id = format!("ORDER-{}", uuid::Uuid::new_v4());
    produce(&client, &order_id).await.unwrap();
    let res = consume(&client, &order_id, None).await.unwrap().expect("tracked");
    assert!(res.success, "{:?}", res.discrepancies);
    client.close();
}
