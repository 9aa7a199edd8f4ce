pub mod api;
pub mod error;

use crate::cli::Args;
use crate::gateway::CompletionGateway;
use std::error::Error;

pub struct Server {
    gateway: CompletionGateway,
    args: Args,
}

impl Server {
    pub fn new(gateway: CompletionGateway, args: Args) -> Self {
        Self { gateway, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(self.gateway.clone(), &self.args).await
    }
}
