use matrimony_core::reference::{ReferenceShape, ReferenceValidator};

use crate::commands::common::storage_config;
use crate::error::CliError;

pub fn run_check_url(url: &str) -> Result<(), CliError> {
    let config = storage_config()?;
    let validator = ReferenceValidator::for_r2(&config)?;
    println!("{}", describe_reference(&validator, url)?);
    Ok(())
}

pub fn describe_reference(validator: &ReferenceValidator, url: &str) -> Result<&'static str, CliError> {
    match validator.classify(url.trim()) {
        Some(ReferenceShape::BucketObject) => Ok("bucket-object"),
        Some(ReferenceShape::DirectHost) => Ok("direct-host"),
        None => Err(CliError::InvalidReference(url.to_string())),
    }
}
