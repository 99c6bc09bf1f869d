#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    referee_report_server::run().await
}
