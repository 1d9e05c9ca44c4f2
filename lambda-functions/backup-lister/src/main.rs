use backup_lister::{BackupListerService, ListRequest, ListResponse};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

async fn function_handler(event: LambdaEvent<ListRequest>) -> Result<ListResponse, Error> {
    let service = BackupListerService::new().await?;
    service.list(&event.payload).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    run(service_fn(function_handler)).await
}
