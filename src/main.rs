#[tokio::main]
async fn main() {
  if let Err(e) = fittrack_lib::run().await {
    eprintln!("fittrack failed: {}", e);
    std::process::exit(1);
  }
}
