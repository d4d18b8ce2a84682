use anyhow::Result;
use sentinel::cli::{actions::console, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (globals, action) = start()?;

    // Handle the action
    console::handle(action, &globals).await?;

    Ok(())
}
