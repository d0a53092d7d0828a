use coursefiles_api::setup;
use coursefiles_core::Config;

// mimalloc keeps fragmentation low under many concurrent uploads, notably on musl.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
