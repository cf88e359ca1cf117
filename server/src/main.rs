#[tokio::main]
async fn main() {
    if let Err(e) = chat_relay_lib::run().await {
        eprintln!("chat-relay: {}", e);
        std::process::exit(1);
    }
}
