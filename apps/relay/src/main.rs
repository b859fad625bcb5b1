use editor_relay::app::run;

use std::env::args;
use std::process::exit;

#[tokio::main]
async fn main() {
    let code = run(args().skip(1)).await;
    exit(code);
}
