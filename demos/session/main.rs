use std::sync::Arc;

use flowedit::{
    AuthSession, SEED_TRIGGER_ID, SessionBuilder,
    command::{Key, KeyEvent},
    model::{Connection, NodeDataPatch, Position},
    nodes::{CONDITION_TRUE_HANDLE, NodeConfig, NodeType},
    persistence::MemBackend,
};
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let backend = Arc::new(MemBackend::new());
    let session = SessionBuilder::new().backend(backend.clone()).build().unwrap();
    session.login(AuthSession::new("demo-user", "demo-token"));

    let mut notifications = session.notifications();
    tokio::spawn(async move {
        while let Some(Ok(notification)) = notifications.next().await {
            println!("[notification] {}", notification);
        }
    });

    session.new_document();
    session.set_name("Daily Digest");

    let condition = session.add_node(NodeType::Condition, Position::new(250.0, 200.0));
    let mut config = NodeConfig::default_for(NodeType::Condition);
    if let NodeConfig::Condition(c) = &mut config {
        c.expression = "$trigger.count > 0".to_string();
    }
    session.update_node(&condition.id, NodeDataPatch::new().config(config));

    let email = session.add_node(NodeType::Email, Position::new(500.0, 200.0));
    session.update_node_json(&email.id, serde_json::json!({ "config": { "to": "team@example.com", "subject": "Digest" } })).unwrap();

    session.connect(Connection::new(SEED_TRIGGER_ID, condition.id.as_str())).unwrap();
    session.connect(Connection::new(condition.id.as_str(), email.id.as_str()).with_source_handle(CONDITION_TRUE_HANDLE)).unwrap();
    session.arrange();

    session.handle_key(KeyEvent::new(Key::Char('s')).ctrl()).await.unwrap();
    println!("Saved as {} (dirty: {})", session.document_id(), session.is_dirty());

    let run = session.execute().await.unwrap();
    println!("Execution {} is {}", run.id, run.status.as_ref());

    let file = session.export().unwrap();
    println!("Exported {}:\n{}", file.filename, file.contents);

    session.teardown();
}
