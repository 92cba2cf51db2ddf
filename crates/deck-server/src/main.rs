use clap::Parser;
use deck_core::types::Organization;
use deck_server::AppState;

#[derive(Parser)]
#[command(
    name = "deck-server",
    about = "Automation-configuration API — path-namespaced scripts with live change streams",
    version
)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "DECK_PORT", default_value_t = 3333)]
    port: u16,

    /// Seed an organization with this id at startup (local development)
    #[arg(long, env = "DECK_SEED_ORG")]
    seed_org: Option<String>,

    /// Owner of the seeded organization
    #[arg(long, env = "DECK_SEED_OWNER", requires = "seed_org")]
    seed_owner: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let state = AppState::in_memory();

    if let Some(org_id) = &cli.seed_org {
        state
            .store
            .insert_organization(Organization::new(
                org_id.clone(),
                org_id.clone(),
                cli.seed_owner.clone(),
            ))
            .await?;
        tracing::info!(org = %org_id, "seeded organization");
    }

    deck_server::serve(state, cli.port).await
}
