#[actix_web::main]
async fn main() {
    if let Err(err) = csvquery_lib::run().await {
        tracing::error!(error = %err, "csvquery exited with an error");
        std::process::exit(1);
    }
}
