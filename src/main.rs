//! swapquote server
//!
//! Main entry point for the route aggregation server

use swapquote::SwapQuoteBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	SwapQuoteBuilder::new().start_server().await
}
