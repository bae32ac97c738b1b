use anyhow::Result;
use sortscope_app::terminal::TerminalShell;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    info!("starting sortscope terminal shell");
    TerminalShell::default().run()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
