pub mod models;
pub mod server;
pub mod gateway;
pub mod llm;
pub mod cli;
pub mod client;

use cli::{ Args, ClientArgs };
use client::ChatApi;
use client::terminal::TerminalChat;
use gateway::CompletionGateway;
use llm::chat::new_client as new_chat_client;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Listen Address: {}:{}", args.host, args.port);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Chat Model: {}", args.chat_model);
    info!("Max Tokens: {}", args.max_tokens);
    info!("Temperature: {}", args.temperature);
    info!("System Prompt: {}", args.system_prompt);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let chat_client = new_chat_client(&args.llm_config())?;
    info!(
        "Chat client configured: Model={}, BaseURL={:?}",
        chat_client.get_model(),
        chat_client.get_base_url().as_deref().unwrap_or("adapter default")
    );
    let gateway = CompletionGateway::new(chat_client, args.system_prompt.clone());
    let server = Server::new(gateway, args);
    server.run().await?;

    Ok(())
}

pub async fn run_client(args: ClientArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Connecting to chatpad server at {}", args.server_url);
    let api = ChatApi::new(&args.server_url)?;
    TerminalChat::new(api).run().await
}
