use matrimony_core::storage::R2Storage;

use crate::commands::common::storage_config;
use crate::error::CliError;

pub async fn run_check_storage() -> Result<(), CliError> {
    let config = storage_config()?;
    let endpoint = config.endpoint_url();
    let bucket = config.bucket.clone();

    R2Storage::new(config).bucket_is_reachable().await?;
    println!("Bucket '{bucket}' is reachable at {endpoint}");
    Ok(())
}
