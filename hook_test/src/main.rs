mod scenarios;
mod test_ctx;

use srx_intercept::set_debug;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    set_debug(true);
    scenarios::run_all();
    println!("hook_test all scenarios passed");
}
