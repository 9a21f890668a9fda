#[tokio::main]
async fn main() {
    if let Err(e) = securesnip_lib::cli::run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
