#[tokio::main]
async fn main() -> anyhow::Result<()> {
    balanced_books::cli::run_with_sys_args().await
}
