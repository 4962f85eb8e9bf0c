use log::error;

use mindstep_gateway::{AppState, GatewayConfig};

#[tokio::main]
async fn main()
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let state = match GatewayConfig::from_env()
      .and_then(AppState::from_config)
    {   Ok(state) => state
      , Err(e) => {
          error!("Startup failed: {}", e);
          std::process::exit(1);
        }
    };

    if let Err(e) = mindstep_gateway::server::serve(state).await
    {   error!("Server error: {}", e);
        std::process::exit(1);
    }
}
